use crate::error::ConvertError;
use crate::extraction::{Page, TextFragment};
use crate::formats::schema::{AnchorAlignment, AnchorDef, Membership, SectionsDef};
use crate::layout::assign::column_index;
use crate::layout::header::HeaderLayout;
use crate::layout::RowSpec;
use regex::Regex;

const HEADER_X_EPSILON: f32 = 0.01;

/// Decides which fragments open a new table row.
#[derive(Debug, Clone)]
pub struct AnchorMatcher {
    patterns: Vec<Regex>,
    column: usize,
    alignment: AnchorAlignment,
}

impl AnchorMatcher {
    pub fn new(def: &AnchorDef) -> Result<Self, ConvertError> {
        let patterns = def
            .patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{p})$")).map_err(|e| {
                    ConvertError::FormatInvalid(format!("anchor pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnchorMatcher {
            patterns,
            column: def.column,
            alignment: def.alignment,
        })
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// True when the whole text matches one of the patterns.
    pub fn matches_text(&self, text: &str) -> bool {
        let text = text.trim();
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn is_anchor(
        &self,
        fragment: &TextFragment,
        header: &HeaderLayout,
        membership: Membership,
    ) -> bool {
        if !self.matches_text(&fragment.text) {
            return false;
        }
        match self.alignment {
            AnchorAlignment::InColumn => {
                column_index(&header.columns, fragment, membership) == Some(self.column)
            }
            AnchorAlignment::HeaderX => header
                .fragments
                .get(self.column)
                .is_some_and(|h| (h.x - fragment.x).abs() < HEADER_X_EPSILON),
        }
    }
}

/// One vertical band per anchor, in anchor order.
pub fn row_spans(
    anchors: &[&TextFragment],
    margin_below: f32,
    margin_above: f32,
    extend_below_by_height: bool,
) -> Vec<RowSpec> {
    anchors
        .iter()
        .enumerate()
        .map(|(row_index, anchor)| {
            let below = if extend_below_by_height {
                anchor.height
            } else {
                0.0
            };
            RowSpec {
                row_index,
                y_bottom: anchor.y - below - margin_below,
                y_top: anchor.top() + margin_above,
            }
        })
        .collect()
}

/// First band containing the fragment's baseline.
///
/// With `overlap`, a fragment whose baseline sits below a band but whose top
/// reaches into it also belongs to that band.
pub fn row_index(spans: &[RowSpec], fragment: &TextFragment, overlap: bool) -> Option<usize> {
    spans
        .iter()
        .find(|band| {
            let inside = band.y_bottom <= fragment.y && fragment.y <= band.y_top;
            inside || (overlap && fragment.y <= band.y_bottom && fragment.top() >= band.y_bottom)
        })
        .map(|band| band.row_index)
}

/// Fragments before the first one whose text equals `marker`.
///
/// The flag reports whether the marker was seen, which ends the document.
pub fn cut_at_end_marker<'a>(
    fragments: &'a [TextFragment],
    marker: Option<&str>,
) -> (&'a [TextFragment], bool) {
    let Some(marker) = marker else {
        return (fragments, false);
    };
    match fragments.iter().position(|f| f.text.trim() == marker) {
        Some(pos) => (&fragments[..pos], true),
        None => (fragments, false),
    }
}

/// Position of the text that starts the marked section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMarker {
    pub page_number: usize,
    pub y: f32,
    pub label: String,
}

impl SectionMarker {
    /// Whether a fragment lies in the marked section: on a later page, or on
    /// the marker's page at or below the marker.
    pub fn covers(&self, page_number: usize, fragment: &TextFragment) -> bool {
        page_number > self.page_number || (page_number == self.page_number && fragment.y <= self.y)
    }
}

/// Scan pages from last to first for a section marker.
pub fn find_section_marker(pages: &[Page], def: &SectionsDef) -> Option<SectionMarker> {
    pages.iter().rev().find_map(|page| {
        def.markers.iter().find_map(|marker| {
            page.fragments
                .iter()
                .find(|f| f.text.contains(&marker.contains))
                .map(|f| SectionMarker {
                    page_number: page.page_number,
                    y: f.y,
                    label: marker.label.clone(),
                })
        })
    })
}

/// What a fragment means to the sequence row builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Header,
    Anchor,
    Body,
}

type Predicate<'a> = Box<dyn Fn(&TextFragment) -> bool + 'a>;

/// Ordered predicate table; the first matching rule decides the role and
/// anything unmatched is [`Role::Body`].
pub struct Classifier<'a> {
    rules: Vec<(Predicate<'a>, Role)>,
}

impl<'a> Classifier<'a> {
    pub fn new() -> Self {
        Classifier { rules: Vec::new() }
    }

    pub fn rule(mut self, role: Role, predicate: impl Fn(&TextFragment) -> bool + 'a) -> Self {
        self.rules.push((Box::new(predicate), role));
        self
    }

    pub fn classify(&self, fragment: &TextFragment) -> Role {
        self.rules
            .iter()
            .find(|(predicate, _)| predicate(fragment))
            .map_or(Role::Body, |(_, role)| *role)
    }
}

impl Default for Classifier<'_> {
    fn default() -> Self {
        Classifier::new()
    }
}

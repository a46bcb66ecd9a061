//! Positional table reconstruction.
//!
//! Header fragments fix the column spans, anchor fragments fix the rows, and
//! every other fragment is dropped into the (row, column) cell it falls in.

pub mod anchor;
pub mod assemble;
pub mod assign;
pub mod header;

use crate::error::ConvertError;
use crate::extraction::{Page, TextFragment};
use crate::formats::schema::{FormatSpec, HeaderScope, RowPolicy};
use anchor::{AnchorMatcher, Classifier, Role, SectionMarker};
use header::HeaderLayout;
use serde::Serialize;

/// Horizontal extent of one output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub title: String,
    pub col_index: usize,
    pub x_left: f32,
    pub x_right: f32,
}

/// Vertical band of one output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSpec {
    pub row_index: usize,
    pub y_bottom: f32,
    pub y_top: f32,
}

/// How the fragment texts of one cell combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellJoin {
    /// Trim every fragment, then concatenate. Used for reading-order rows.
    TrimEach,
    /// Concatenate the raw texts and trim the cell once, so spaces between
    /// fragments survive. Used for span rows.
    TrimJoined,
}

impl From<&RowPolicy> for CellJoin {
    fn from(policy: &RowPolicy) -> Self {
        match policy {
            RowPolicy::Span { .. } => CellJoin::TrimJoined,
            RowPolicy::Sequence { .. } => CellJoin::TrimEach,
        }
    }
}

/// A row under construction: fragments collected per column.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRow {
    /// 0 for the default section, 1 for the marked section.
    pub section: usize,
    pub cells: Vec<Vec<TextFragment>>,
}

impl PartialRow {
    pub fn new(section: usize, num_columns: usize) -> Self {
        PartialRow {
            section,
            cells: vec![Vec::new(); num_columns],
        }
    }

    /// Cell texts, each the concatenation of its trimmed fragments.
    pub fn texts(&self) -> Vec<String> {
        self.texts_joined(CellJoin::TrimEach)
    }

    pub fn texts_joined(&self, join: CellJoin) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| match join {
                CellJoin::TrimEach => cell.iter().map(|f| f.text.trim()).collect(),
                CellJoin::TrimJoined => cell
                    .iter()
                    .map(|f| f.text.as_str())
                    .collect::<String>()
                    .trim()
                    .to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartialTable {
    pub rows: Vec<PartialRow>,
    /// Fragments that matched no row or no column.
    pub ignored: Vec<TextFragment>,
}

/// Everything read off the pages, before row filtering and derived columns.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub title: Option<String>,
    /// Located header labels, in column order.
    pub header: Vec<String>,
    pub rows: Vec<PartialRow>,
    /// Label per section index; empty when the format has no sections.
    pub section_labels: Vec<String>,
    pub card_suffix: Option<String>,
    pub ignored: Vec<TextFragment>,
    pub join: CellJoin,
}

impl Extraction {
    pub fn text_rows(&self) -> Vec<assemble::TextRow> {
        self.rows
            .iter()
            .map(|row| assemble::TextRow {
                label: self.section_labels.get(row.section).cloned(),
                cells: row.texts_joined(self.join),
            })
            .collect()
    }
}

/// Run header location, anchor detection and cell assignment over a document.
pub fn extract(pages: &[Page], spec: &FormatSpec) -> Result<Extraction, ConvertError> {
    let anchor_def = spec.anchor.as_ref().ok_or_else(|| {
        ConvertError::FormatInvalid(format!("format '{}' has no anchor", spec.key))
    })?;
    let matcher = AnchorMatcher::new(anchor_def)?;
    let membership = spec.columns.membership;

    let document_header = match spec.header_scope {
        HeaderScope::Document => Some(header::locate_in_document(pages, spec)?),
        HeaderScope::Page => None,
    };
    let title = spec.title.as_ref().map(|def| header::find_title(pages, def));
    let card_suffix = spec
        .card_suffix
        .as_ref()
        .map(|def| header::find_card_suffix(pages, def))
        .transpose()?;

    let marker = spec
        .sections
        .as_ref()
        .and_then(|def| anchor::find_section_marker(pages, def));
    let section_labels = section_labels(spec, marker.as_ref());
    if let Some(ref m) = marker {
        log::debug!("section '{}' starts on page {} at y={}", m.label, m.page_number, m.y);
    }

    let mut header_titles = document_header.as_ref().map(HeaderLayout::titles);
    let mut rows = Vec::new();
    let mut ignored = Vec::new();

    for page in pages {
        if page.page_number < spec.first_page {
            continue;
        }
        let page_header;
        let header = match document_header {
            Some(ref h) => h,
            None => {
                page_header = header::locate_on_page(page, spec)?;
                &page_header
            }
        };
        header_titles.get_or_insert_with(|| header.titles());

        let (fragments, ended) = anchor::cut_at_end_marker(&page.fragments, spec.end_marker.as_deref());
        let section_of = |f: &TextFragment| {
            marker
                .as_ref()
                .map_or(0, |m| usize::from(m.covers(page.page_number, f)))
        };

        let partial = match spec.rows {
            RowPolicy::Span {
                margin_below,
                margin_above,
                extend_below_by_height,
                overlap,
            } => {
                let anchors: Vec<&TextFragment> = fragments
                    .iter()
                    .filter(|f| matcher.is_anchor(f, header, membership))
                    .collect();
                let spans =
                    anchor::row_spans(&anchors, margin_below, margin_above, extend_below_by_height);
                assign::assign_by_span(
                    fragments,
                    &header.columns,
                    membership,
                    &anchors,
                    &spans,
                    overlap,
                    section_of,
                )
            }
            RowPolicy::Sequence { skip_headers } => {
                let classifier = Classifier::new()
                    .rule(Role::Header, |f| skip_headers && header.is_header(f))
                    .rule(Role::Anchor, |f| matcher.is_anchor(f, header, membership));
                assign::assign_by_sequence(
                    fragments,
                    &header.columns,
                    membership,
                    &classifier,
                    matcher.column(),
                    section_of,
                )
            }
        };

        log::debug!(
            "page {}: {} row(s), {} ignored fragment(s)",
            page.page_number,
            partial.rows.len(),
            partial.ignored.len()
        );
        rows.extend(partial.rows);
        ignored.extend(partial.ignored);

        if ended {
            log::debug!("end marker reached on page {}", page.page_number);
            break;
        }
    }

    let header = header_titles.ok_or_else(|| {
        ConvertError::Structural("no page at or after the first data page has a header row".into())
    })?;

    Ok(Extraction {
        title,
        header,
        rows,
        section_labels,
        card_suffix,
        ignored,
        join: CellJoin::from(&spec.rows),
    })
}

fn section_labels(spec: &FormatSpec, marker: Option<&SectionMarker>) -> Vec<String> {
    let Some(ref def) = spec.sections else {
        return Vec::new();
    };
    let mut labels = vec![def.default_label.clone()];
    if let Some(m) = marker {
        labels.push(m.label.clone());
    }
    labels
}

use crate::error::ConvertError;
use crate::extraction::{Page, TextFragment};
use crate::formats::schema::{CardSuffixDef, ColumnRuleDef, FormatSpec, SpanRule, TitleDef};
use crate::layout::ColumnSpec;
use regex::Regex;

/// The header row as located on one page.
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    pub page_number: usize,
    /// Matched header fragments, in expected-label order.
    pub fragments: Vec<TextFragment>,
    pub columns: Vec<ColumnSpec>,
}

impl HeaderLayout {
    pub fn titles(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.title.clone()).collect()
    }

    pub fn is_header(&self, fragment: &TextFragment) -> bool {
        self.fragments.contains(fragment)
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.columns.iter().any(|c| c.title == title)
    }
}

/// For each expected label, the first fragment whose text equals it.
///
/// Labels with no matching fragment are dropped, so the result keeps the
/// expected order but may be shorter than `labels`.
pub fn find_header_fragments<'a>(
    fragments: &'a [TextFragment],
    labels: &[String],
) -> Vec<&'a TextFragment> {
    labels
        .iter()
        .filter_map(|label| fragments.iter().find(|f| f.text == *label))
        .collect()
}

/// Compute each column's horizontal span from the located header fragments.
pub fn column_spans(found: &[&TextFragment], rule: &ColumnRuleDef) -> Vec<ColumnSpec> {
    found
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let right_margin = rule
                .right_margin_overrides
                .get(&header.text)
                .copied()
                .unwrap_or(rule.right_margin);
            let x_right = match rule.rule {
                SpanRule::NextHeader => {
                    found.get(i + 1).map_or(rule.last_right, |next| next.x) + right_margin
                }
                SpanRule::OwnWidth => header.right() + right_margin,
            };
            ColumnSpec {
                title: header.text.clone(),
                col_index: i,
                x_left: header.x - rule.left_margin,
                x_right,
            }
        })
        .collect()
}

/// Locate the header row on a single page.
pub fn locate_on_page(page: &Page, spec: &FormatSpec) -> Result<HeaderLayout, ConvertError> {
    let layout = layout_from(page, spec);
    require_anchor_header(&layout, spec)?;
    Ok(layout)
}

/// Locate the header row once for the whole document.
///
/// Pages listed in `header_pages` are tried in order and the first one with
/// any matching header wins.
pub fn locate_in_document(pages: &[Page], spec: &FormatSpec) -> Result<HeaderLayout, ConvertError> {
    let primary = spec.header_pages.first().copied().unwrap_or(1);
    let mut chosen = None;

    for &page_number in &spec.header_pages {
        let Some(page) = pages.iter().find(|p| p.page_number == page_number) else {
            continue;
        };
        let layout = layout_from(page, spec);
        if !layout.columns.is_empty() {
            if page_number != primary {
                log::warn!("no header row on page {primary}, using page {page_number}");
            }
            chosen = Some(layout);
            break;
        }
    }

    let layout = chosen.unwrap_or(HeaderLayout {
        page_number: primary,
        fragments: Vec::new(),
        columns: Vec::new(),
    });
    require_anchor_header(&layout, spec)?;
    Ok(layout)
}

fn layout_from(page: &Page, spec: &FormatSpec) -> HeaderLayout {
    let found = find_header_fragments(&page.fragments, &spec.headers);
    let columns = column_spans(&found, &spec.columns);
    HeaderLayout {
        page_number: page.page_number,
        fragments: found.into_iter().cloned().collect(),
        columns,
    }
}

fn require_anchor_header(layout: &HeaderLayout, spec: &FormatSpec) -> Result<(), ConvertError> {
    let Some(ref anchor) = spec.anchor else {
        return Ok(());
    };
    if !layout.has_title(&anchor.required_header) {
        return Err(ConvertError::Structural(format!(
            "header '{}' not found on page {}",
            anchor.required_header, layout.page_number
        )));
    }
    if anchor.column >= layout.columns.len() {
        return Err(ConvertError::Structural(format!(
            "anchor column {} missing: only {} header(s) found on page {}",
            anchor.column,
            layout.columns.len(),
            layout.page_number
        )));
    }
    Ok(())
}

/// Statement title: the first fragment on the first page containing the
/// marker text, or the configured fallback.
pub fn find_title(pages: &[Page], def: &TitleDef) -> String {
    let found = pages.first().and_then(|page| {
        page.fragments
            .iter()
            .find(|f| f.text.contains(&def.contains))
    });
    match found {
        Some(fragment) => fragment.text.trim().to_string(),
        None => {
            log::warn!("title '{}' not found, using fallback", def.contains);
            def.fallback.clone()
        }
    }
}

/// Last four digits of the card number printed on the first page.
pub fn find_card_suffix(pages: &[Page], def: &CardSuffixDef) -> Result<String, ConvertError> {
    let re = Regex::new(&def.pattern)
        .map_err(|e| ConvertError::FormatInvalid(format!("card_suffix pattern: {e}")))?;
    let fragment = pages
        .first()
        .and_then(|page| page.fragments.iter().find(|f| re.is_match(&f.text)))
        .ok_or_else(|| {
            ConvertError::Structural(format!("card number matching '{}' not found", def.pattern))
        })?;
    Ok(last_four_digits(&fragment.text).unwrap_or_else(|| def.fallback.clone()))
}

fn last_four_digits(text: &str) -> Option<String> {
    let digits: Vec<char> = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let start = digits.len().saturating_sub(4);
    Some(digits[start..].iter().collect())
}

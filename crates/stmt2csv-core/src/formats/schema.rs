use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declarative description of one bank statement layout.
///
/// Adding a bank means writing one of these, not code: the engine in
/// [`crate::layout`] reads every policy decision from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Unique adapter key (e.g. `cmb_credit`).
    pub key: String,
    /// Display name.
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source: SourceFormat,
    /// Expected column header labels, in output order.
    pub headers: Vec<String>,
    #[serde(default)]
    pub title: Option<TitleDef>,
    /// Pages searched for the header row, in order; the first page with any
    /// header wins.
    #[serde(default = "default_header_pages")]
    pub header_pages: Vec<usize>,
    #[serde(default)]
    pub header_scope: HeaderScope,
    #[serde(default)]
    pub columns: ColumnRuleDef,
    #[serde(default)]
    pub anchor: Option<AnchorDef>,
    #[serde(default)]
    pub rows: RowPolicy,
    /// Pages before this one never contribute rows.
    #[serde(default = "default_first_page")]
    pub first_page: usize,
    /// Exact text that ends the listing; it and everything after are dropped.
    #[serde(default)]
    pub end_marker: Option<String>,
    #[serde(default)]
    pub sections: Option<SectionsDef>,
    #[serde(default)]
    pub card_suffix: Option<CardSuffixDef>,
    #[serde(default)]
    pub exclude_rows: Vec<ExcludeRowDef>,
    #[serde(default)]
    pub short_dates: Option<ShortDateDef>,
    #[serde(default)]
    pub email: Option<EmailTableDef>,
}

fn default_header_pages() -> Vec<usize> {
    vec![1]
}

fn default_first_page() -> usize {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Eml,
}

impl SourceFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::Eml => "eml",
        }
    }

    pub fn from_extension(ext: &str) -> Option<SourceFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "eml" => Some(SourceFormat::Eml),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Title line detection: the first fragment on page 1 containing `contains`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleDef {
    pub contains: String,
    /// Title written when no fragment matches.
    pub fallback: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderScope {
    /// Locate headers once and reuse the columns on every page.
    #[default]
    Document,
    /// Locate headers again on every page.
    Page,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRuleDef {
    #[serde(default)]
    pub rule: SpanRule,
    #[serde(default)]
    pub left_margin: f32,
    #[serde(default)]
    pub right_margin: f32,
    /// Per-label replacement for `right_margin`.
    #[serde(default)]
    pub right_margin_overrides: BTreeMap<String, f32>,
    /// Right edge of the last column under `next_header`.
    #[serde(default = "default_last_right")]
    pub last_right: f32,
    #[serde(default)]
    pub membership: Membership,
}

fn default_last_right() -> f32 {
    999.0
}

impl Default for ColumnRuleDef {
    fn default() -> Self {
        ColumnRuleDef {
            rule: SpanRule::default(),
            left_margin: 0.0,
            right_margin: 0.0,
            right_margin_overrides: BTreeMap::new(),
            last_right: default_last_right(),
            membership: Membership::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanRule {
    /// From this header's left edge to the next header's left edge.
    #[default]
    NextHeader,
    /// The header's own extent.
    OwnWidth,
}

/// How a fragment's horizontal extent is tested against a column span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// Left edge inside the span.
    #[default]
    LeftEdge,
    /// Left edge inside the span, or the fragment straddles the span's left boundary.
    Overlap,
    /// Whole fragment inside the span.
    Contained,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorDef {
    /// Index of the anchor column among the located headers.
    pub column: usize,
    /// Header label whose absence makes the conversion fail.
    pub required_header: String,
    /// Alternative patterns; the whole fragment text must match one.
    pub patterns: Vec<String>,
    #[serde(default)]
    pub alignment: AnchorAlignment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorAlignment {
    /// The fragment falls in the anchor column by the membership test.
    #[default]
    InColumn,
    /// The fragment's left edge equals the anchor header's left edge.
    HeaderX,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RowPolicy {
    /// Each anchor defines a vertical band; fragments join the band containing them.
    Span {
        margin_below: f32,
        margin_above: f32,
        /// Extend the band below the baseline by one fragment height.
        #[serde(default)]
        extend_below_by_height: bool,
        /// Also match fragments that straddle the band's bottom edge.
        #[serde(default)]
        overlap: bool,
    },
    /// Each anchor opens a row; following fragments join it until the next anchor.
    Sequence {
        /// Skip the header fragments instead of reporting them as ignored.
        #[serde(default)]
        skip_headers: bool,
    },
}

impl Default for RowPolicy {
    fn default() -> Self {
        RowPolicy::Sequence {
            skip_headers: false,
        }
    }
}

/// Splits a statement into a default section and a marked section with a
/// derived label column (e.g. `币种`: `CNY` / `USD`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsDef {
    pub column_title: String,
    pub default_label: String,
    /// Checked in order on each page, scanning pages from last to first.
    pub markers: Vec<SectionMarkerDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionMarkerDef {
    pub contains: String,
    pub label: String,
}

/// Appends the last four digits of a card number found on the first page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSuffixDef {
    pub pattern: String,
    pub column_title: String,
    #[serde(default = "default_card_fallback")]
    pub fallback: String,
}

fn default_card_fallback() -> String {
    "未知卡号".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeRowDef {
    pub column: String,
    pub contains: String,
}

/// Expands `MM/DD` cells into full dates using the statement title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortDateDef {
    pub columns: Vec<String>,
    /// Regex with a `year` group and an optional `month` group.
    pub title_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTableDef {
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
}

fn default_table_selector() -> String {
    "table".into()
}

impl Default for EmailTableDef {
    fn default() -> Self {
        EmailTableDef {
            table_selector: default_table_selector(),
        }
    }
}

use crate::formats::schema::{FormatSpec, ShortDateDef};
use crate::table::Table;
use chrono::NaiveDate;
use regex::Regex;

/// A row reduced to cell texts, with its section label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub label: Option<String>,
    pub cells: Vec<String>,
}

/// Turn text rows into the output table.
///
/// Blank rows and rows hitting an exclusion phrase are dropped, short dates
/// are expanded, then the section label and card suffix columns are appended.
pub fn assemble(
    spec: &FormatSpec,
    title: Option<String>,
    header: Vec<String>,
    rows: Vec<TextRow>,
    card_suffix: Option<String>,
) -> Table {
    let exclusions: Vec<(usize, &str)> = spec
        .exclude_rows
        .iter()
        .filter_map(|rule| {
            header
                .iter()
                .position(|h| *h == rule.column)
                .map(|i| (i, rule.contains.as_str()))
        })
        .collect();
    let short_dates = spec
        .short_dates
        .as_ref()
        .and_then(|def| ShortDates::new(def, title.as_deref(), &header));

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if row.cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if let Some((_, phrase)) = exclusions
            .iter()
            .find(|(i, phrase)| row.cells.get(*i).is_some_and(|c| c.contains(phrase)))
        {
            log::debug!("dropping row containing '{phrase}'");
            continue;
        }

        let mut cells = row.cells;
        if let Some(ref expander) = short_dates {
            expander.expand(&mut cells);
        }
        if spec.sections.is_some() {
            cells.push(row.label.unwrap_or_default());
        }
        if let Some(ref suffix) = card_suffix {
            cells.push(suffix.clone());
        }
        out.push(cells);
    }

    let mut header = header;
    if let Some(ref def) = spec.sections {
        header.push(def.column_title.clone());
    }
    if let (Some(def), Some(_)) = (&spec.card_suffix, &card_suffix) {
        header.push(def.column_title.clone());
    }

    Table {
        title,
        header,
        rows: out,
    }
}

/// `MM/DD` expansion anchored on the statement's year and month.
#[derive(Debug, Clone)]
struct ShortDates {
    columns: Vec<usize>,
    year: i32,
    month: Option<u32>,
}

impl ShortDates {
    fn new(def: &ShortDateDef, title: Option<&str>, header: &[String]) -> Option<Self> {
        let re = Regex::new(&def.title_pattern).ok()?;
        let Some(caps) = title.and_then(|t| re.captures(t)) else {
            log::warn!("statement year not found in title, short dates left as printed");
            return None;
        };
        let year = caps.name("year")?.as_str().parse().ok()?;
        let month = caps.name("month").and_then(|m| m.as_str().parse().ok());
        let columns = def
            .columns
            .iter()
            .filter_map(|c| header.iter().position(|h| h == c))
            .collect();
        Some(ShortDates {
            columns,
            year,
            month,
        })
    }

    fn expand(&self, cells: &mut [String]) {
        for &i in &self.columns {
            if let Some(cell) = cells.get_mut(i) {
                if let Some(full) = self.full_date(cell) {
                    *cell = full;
                }
            }
        }
    }

    /// Dates in a month after the statement month belong to the previous year.
    fn full_date(&self, cell: &str) -> Option<String> {
        let (mm, dd) = cell.split_once('/')?;
        if mm.len() != 2 || dd.len() != 2 {
            return None;
        }
        let month: u32 = mm.parse().ok()?;
        let day: u32 = dd.parse().ok()?;
        let year = match self.month {
            Some(statement_month) if month > statement_month => self.year - 1,
            _ => self.year,
        };
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
    }
}

use scraper::{ElementRef, Html, Selector};

use crate::error::ConvertError;

fn selector(css: &str) -> Result<Selector, ConvertError> {
    Selector::parse(css).map_err(|e| ConvertError::FormatInvalid(format!("selector '{css}': {e:?}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Direct element children of `parent` with one of the given tag names.
fn child_elements<'a>(
    parent: ElementRef<'a>,
    names: &'static [&'static str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| names.contains(&el.value().name()))
}

/// Rows of `table`'s own `section` (`thead` or `tbody`), ignoring nested tables.
fn section_rows(
    table: ElementRef<'_>,
    section: &'static [&'static str],
    cell: &'static [&'static str],
) -> Vec<Vec<String>> {
    child_elements(table, section)
        .flat_map(|part| child_elements(part, &["tr"]))
        .map(|tr| child_elements(tr, cell).map(cell_text).collect())
        .collect()
}

/// Rows of every table whose header cells equal `headers`.
///
/// Tables are read in document order. A table counts when the texts of one
/// of its own `thead > tr > th` rows match `headers` exactly; each own
/// `tbody > tr` with exactly one `td` per header becomes a row. Rows of
/// tables nested inside a cell belong to the nested table only.
pub fn extract_rows(
    html: &str,
    headers: &[String],
    table_selector: &str,
) -> Result<Vec<Vec<String>>, ConvertError> {
    let doc = Html::parse_document(html);
    let table_sel = selector(table_selector)?;

    let mut rows = Vec::new();
    for (index, table) in doc.select(&table_sel).enumerate() {
        let matches = section_rows(table, &["thead"], &["th"])
            .iter()
            .any(|labels| labels == headers);
        if !matches {
            log::debug!("table {index}: header mismatch, skipped");
            continue;
        }

        let before = rows.len();
        rows.extend(
            section_rows(table, &["tbody"], &["td"])
                .into_iter()
                .filter(|cells| cells.len() == headers.len()),
        );
        log::debug!("table {index}: {} row(s)", rows.len() - before);
    }
    Ok(rows)
}

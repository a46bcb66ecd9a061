use stmt2csv_core::error::ConvertError;
use stmt2csv_core::extraction::page_dump::PageDumpSource;
use stmt2csv_core::extraction::pdftotext::PdftotextSource;
use stmt2csv_core::extraction::FragmentSource;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    page: Option<usize>,
    output_file: Option<PathBuf>,
    pdftotext: Option<PathBuf>,
) -> Result<(), ConvertError> {
    let is_json = input_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let source: Box<dyn FragmentSource> = if is_json {
        Box::new(PageDumpSource::new())
    } else {
        Box::new(match pdftotext {
            Some(path) => PdftotextSource::with_binary(path),
            None => PdftotextSource::new(),
        })
    };

    let bytes = std::fs::read(&input_file)?;
    let mut pages = source.extract_pages(&bytes)?;
    let total = pages.len();
    if let Some(n) = page {
        pages.retain(|p| p.page_number == n);
        if pages.is_empty() {
            return Err(ConvertError::Extraction(format!(
                "page {n} not found ({total} page(s))"
            )));
        }
    }

    match output_file {
        Some(path) => {
            output::json::write(&path, &pages)?;
            eprintln!(
                "Extracted {} page(s) with {}, written to {}",
                pages.len(),
                source.backend_name(),
                path.display()
            );
            output::text::print_page_summary(&pages);
        }
        None => output::json::print(&pages)?,
    }

    Ok(())
}

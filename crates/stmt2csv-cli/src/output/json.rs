use stmt2csv_core::error::ConvertError;
use stmt2csv_core::extraction::Page;
use std::path::Path;

pub fn print(pages: &[Page]) -> Result<(), ConvertError> {
    let json = serde_json::to_string_pretty(pages)?;
    println!("{json}");
    Ok(())
}

/// Written in the shape `PageDumpSource` reads back.
pub fn write(path: &Path, pages: &[Page]) -> Result<(), ConvertError> {
    let json = serde_json::to_string_pretty(pages)?;
    std::fs::write(path, json)?;
    Ok(())
}

use stmt2csv_core::email::{EmailBodySource, MimeEmailSource};
use stmt2csv_core::error::ConvertError;
use std::path::PathBuf;

pub fn run(input_file: PathBuf, output_file: Option<PathBuf>) -> Result<(), ConvertError> {
    let bytes = std::fs::read(&input_file)?;
    let html = MimeEmailSource::new().html_body(&bytes)?;

    match output_file {
        Some(path) => {
            std::fs::write(&path, &html)?;
            eprintln!("HTML body ({} bytes) written to {}", html.len(), path.display());
        }
        None => println!("{html}"),
    }

    Ok(())
}

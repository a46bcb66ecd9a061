use stmt2csv_core::email::MimeEmailSource;
use stmt2csv_core::error::ConvertError;
use stmt2csv_core::extraction::pdftotext::PdftotextSource;
use stmt2csv_core::formats::load_format;
use stmt2csv_core::registry::{find_adapter, Adapter};
use stmt2csv_core::{ConvertOptions, Converter};
use std::path::PathBuf;

use crate::output;

pub struct ConvertArgs {
    pub input_file: PathBuf,
    pub adapter: Option<String>,
    pub format: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub include_title: bool,
    pub show_ignored: bool,
    pub pdftotext: Option<PathBuf>,
}

pub fn run(args: ConvertArgs) -> Result<(), ConvertError> {
    let adapter = match (args.adapter, args.format) {
        (Some(key), _) => find_adapter(&key)?.clone(),
        (None, Some(path)) => Adapter::from_spec(load_format(&path)?),
        (None, None) => {
            return Err(ConvertError::UnknownAdapter(
                "none given, use --adapter or --format".into(),
            ))
        }
    };

    log::debug!("adapter {} ({}), input {}", adapter.key, adapter.name, args.input_file.display());

    let fragments = match args.pdftotext {
        Some(path) => PdftotextSource::with_binary(path),
        None => PdftotextSource::new(),
    };
    let converter = Converter::new(
        Box::new(fragments),
        Box::new(MimeEmailSource::new()),
        ConvertOptions {
            include_title: args.include_title,
        },
    );

    let conversion = converter.convert_file(&adapter, &args.input_file)?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, &conversion.csv)?;
            eprintln!(
                "Converted {} row(s) with {}, written to {}",
                conversion.table.rows.len(),
                adapter.name,
                path.display()
            );
        }
        None => println!("{}", conversion.csv),
    }

    if args.show_ignored {
        output::text::print_ignored(&conversion.ignored);
    }

    Ok(())
}

pub mod email;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod layout;
pub mod registry;
pub mod table;

use std::path::Path;

use email::{EmailBodySource, MimeEmailSource};
use error::ConvertError;
use extraction::page_dump::PageDumpSource;
use extraction::pdftotext::PdftotextSource;
use extraction::{FragmentSource, Page, TextFragment};
use formats::schema::{FormatSpec, SourceFormat};
use layout::assemble::{assemble, TextRow};
use registry::Adapter;
use table::Table;

/// Per-call rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Write the statement title line above the CSV header.
    pub include_title: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            include_title: true,
        }
    }
}

/// Result of converting one statement.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub csv: String,
    pub table: Table,
    /// Fragments that fell outside every row or column.
    pub ignored: Vec<TextFragment>,
}

/// Convert already-extracted pages with a positional format.
pub fn convert_pages(
    pages: &[Page],
    spec: &FormatSpec,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let extraction = layout::extract(pages, spec)?;
    let rows = extraction.text_rows();
    let table = assemble(
        spec,
        extraction.title,
        extraction.header,
        rows,
        extraction.card_suffix,
    );
    if !extraction.ignored.is_empty() {
        log::debug!("{} fragment(s) ignored", extraction.ignored.len());
    }
    log::info!(
        "{}: {} page(s), {} row(s)",
        spec.key,
        pages.len(),
        table.rows.len()
    );
    Ok(finish(table, extraction.ignored, options))
}

/// Convert a PDF, extracting fragments with the given source.
pub fn convert_pdf(
    pdf_bytes: &[u8],
    source: &dyn FragmentSource,
    spec: &FormatSpec,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    log::debug!("extracting fragments with {}", source.backend_name());
    let pages = source.extract_pages(pdf_bytes)?;
    convert_pages(&pages, spec, options)
}

/// Convert the tables of an HTML document.
pub fn convert_html(
    html: &str,
    spec: &FormatSpec,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let selector = spec
        .email
        .as_ref()
        .map_or("table", |e| e.table_selector.as_str());
    let rows = email::html_table::extract_rows(html, &spec.headers, selector)?
        .into_iter()
        .map(|cells| TextRow { label: None, cells })
        .collect();
    let table = assemble(spec, None, spec.headers.clone(), rows, None);
    log::info!("{}: {} row(s) from HTML tables", spec.key, table.rows.len());
    Ok(finish(table, Vec::new(), options))
}

/// Convert an email, pulling its HTML body with the given source.
pub fn convert_email(
    eml_bytes: &[u8],
    source: &dyn EmailBodySource,
    spec: &FormatSpec,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let html = source.html_body(eml_bytes)?;
    convert_html(&html, spec, options)
}

fn finish(table: Table, ignored: Vec<TextFragment>, options: &ConvertOptions) -> Conversion {
    Conversion {
        csv: table.to_csv(options.include_title),
        table,
        ignored,
    }
}

/// Collaborators and options for converting statements.
pub struct Converter {
    pub fragments: Box<dyn FragmentSource>,
    pub email: Box<dyn EmailBodySource>,
    pub options: ConvertOptions,
}

impl Converter {
    pub fn new(
        fragments: Box<dyn FragmentSource>,
        email: Box<dyn EmailBodySource>,
        options: ConvertOptions,
    ) -> Self {
        Converter {
            fragments,
            email,
            options,
        }
    }

    /// Convert document bytes, dispatching on the adapter's source format.
    pub fn convert(&self, adapter: &Adapter, bytes: &[u8]) -> Result<Conversion, ConvertError> {
        match adapter.spec.source {
            SourceFormat::Pdf => {
                convert_pdf(bytes, self.fragments.as_ref(), &adapter.spec, &self.options)
            }
            SourceFormat::Eml => {
                convert_email(bytes, self.email.as_ref(), &adapter.spec, &self.options)
            }
        }
    }

    /// Convert a file, choosing the input kind by extension.
    ///
    /// `.json` files are read as page dumps and fed straight to the layout
    /// engine.
    pub fn convert_file(&self, adapter: &Adapter, path: &Path) -> Result<Conversion, ConvertError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !adapter.accepts_extension(&extension) {
            return Err(ConvertError::UnsupportedSource {
                adapter: adapter.key.clone(),
                extension,
            });
        }

        let bytes = std::fs::read(path)?;
        if extension == "json" {
            let pages = PageDumpSource::new().extract_pages(&bytes)?;
            return convert_pages(&pages, &adapter.spec, &self.options);
        }
        self.convert(adapter, &bytes)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new(
            Box::new(PdftotextSource::new()),
            Box::new(MimeEmailSource::new()),
            ConvertOptions::default(),
        )
    }
}

use crate::error::ConvertError;
use crate::extraction::{FragmentSource, Page, TextFragment};
use serde::Deserialize;

/// Fragment backend reading JSON page dumps instead of a PDF.
///
/// Accepts three shapes:
/// - an array of pages, each an array of pdf.js text items
///   (`{"str", "transform": [a, b, c, d, x, y], "width", "height"}`)
/// - a single page as a flat array of pdf.js text items
/// - the `Page` list written by `stmt2csv fragments`
///
/// Items without text (marked content) or with blank text are dropped.
pub struct PageDumpSource;

impl PageDumpSource {
    pub fn new() -> Self {
        PageDumpSource
    }
}

impl Default for PageDumpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TextItem {
    #[serde(default, rename = "str")]
    text: Option<String>,
    #[serde(default)]
    transform: Vec<f32>,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Pages(Vec<Vec<TextItem>>),
    Extracted(Vec<Page>),
    SinglePage(Vec<TextItem>),
}

impl FragmentSource for PageDumpSource {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ConvertError> {
        let dump: DumpFile = serde_json::from_slice(bytes)?;
        let pages = match dump {
            DumpFile::Pages(pages) => pages
                .into_iter()
                .enumerate()
                .map(|(i, items)| items_to_page(i + 1, items))
                .collect(),
            DumpFile::Extracted(pages) => pages
                .into_iter()
                .map(|mut page| {
                    page.fragments.retain(|f| !f.text.trim().is_empty());
                    page
                })
                .collect(),
            DumpFile::SinglePage(items) => vec![items_to_page(1, items)],
        };
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "page-dump"
    }
}

fn items_to_page(page_number: usize, items: Vec<TextItem>) -> Page {
    let fragments = items
        .into_iter()
        .filter_map(|item| {
            let text = item.text?;
            if text.trim().is_empty() || item.transform.len() < 6 {
                return None;
            }
            Some(TextFragment {
                text,
                x: item.transform[4],
                y: item.transform[5],
                width: item.width,
                height: item.height,
                page_index: page_number - 1,
            })
        })
        .collect();

    Page {
        page_number,
        fragments,
    }
}

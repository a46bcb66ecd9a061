pub mod page_dump;
pub mod pdftotext;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A run of text with its position on the page.
///
/// `x` is the left edge and `y` the baseline, both in PDF user space with the
/// origin at the bottom-left corner, so `y + height` lies above the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub page_index: usize,
}

impl TextFragment {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Fragments of a single page, in the order the document produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub page_number: usize,
    pub fragments: Vec<TextFragment>,
}

/// Trait for backends that turn a document into positioned text fragments.
pub trait FragmentSource: Send + Sync {
    /// Extract the fragments of every page, one `Page` per page in ascending order.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ConvertError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

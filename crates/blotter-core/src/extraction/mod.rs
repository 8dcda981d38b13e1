pub mod geometry;
pub mod poppler;

use crate::error::{BlotterError, PageFault};
use crate::model::{ImageRegion, Token};

/// Content the document source supplies for a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    /// Word tokens in reading order. Empty when the source has no word boxes.
    pub tokens: Vec<Token>,
    /// Plain page text, used only when `tokens` is empty.
    pub fallback_text: String,
    /// Image fragments in extraction order.
    pub images: Vec<ImageRegion>,
}

/// Outcome of extracting one page: its content, or the reason it could not be read.
pub type PageExtraction = Result<PageContent, PageFault>;

/// Trait for document source backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract every page of a PDF in document order.
    ///
    /// The outer error means the page list itself could not be produced.
    /// A page that fails on its own is returned as an inner `Err`.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, BlotterError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

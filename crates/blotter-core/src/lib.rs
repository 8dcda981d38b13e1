pub mod config;
pub mod correlate;
pub mod error;
pub mod extraction;
pub mod grammar;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod sink;

use error::BlotterError;
use extraction::PdfExtractor;
pub use pipeline::{DocumentRecords, PageRange, RecordEngine};

/// Main API entry point: extract booking records from a PDF report.
///
/// The extractor supplies pages; each page is assembled into lines, matched
/// against the report grammar and correlated with its images. A page the
/// extractor could not read is reported in `faults` and does not stop the
/// remaining pages. Only failing to produce the page list at all is an error.
pub fn extract_records(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    engine: &RecordEngine,
    range: PageRange,
) -> Result<DocumentRecords, BlotterError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    log::debug!(
        "{} returned {} page(s)",
        extractor.backend_name(),
        pages.len()
    );

    let doc = engine.process_pages(pages, range);

    log::info!(
        "extracted {} record(s), {} with images, from {} page(s); {} page fault(s)",
        doc.pairs.len(),
        doc.images_assigned(),
        doc.pages_processed,
        doc.faults.len()
    );
    Ok(doc)
}

use crate::config::{validate_config, EngineConfig};
use crate::correlate::{correlate, CorrelationMode};
use crate::error::{BlotterError, PageFault};
use crate::extraction::{PageContent, PageExtraction};
use crate::grammar::RecordMatcher;
use crate::layout::LineAssembler;
use crate::model::{Line, RecordImagePair};
use serde::{Deserialize, Serialize};

/// Inclusive, 1-based range of pages to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    /// Last page to process; `None` runs to the end of the document.
    pub last: Option<usize>,
}

impl PageRange {
    pub fn all() -> Self {
        PageRange {
            first: 1,
            last: None,
        }
    }

    pub fn new(first: Option<usize>, last: Option<usize>) -> Self {
        PageRange {
            first: first.unwrap_or(1).max(1),
            last,
        }
    }

    pub fn contains(&self, page_number: usize) -> bool {
        page_number >= self.first && self.last.map_or(true, |last| page_number <= last)
    }

    /// True once `page_number` lies beyond the end of the range.
    pub fn is_past(&self, page_number: usize) -> bool {
        self.last.is_some_and(|last| page_number > last)
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::all()
    }
}

/// Result of one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Records {
        page_number: usize,
        pairs: Vec<RecordImagePair>,
    },
    Fault(PageFault),
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecords {
    /// Pairs in page order, then top-to-bottom within a page.
    pub pairs: Vec<RecordImagePair>,
    /// Pages that could not be extracted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<PageFault>,
    /// Number of pages that produced content (with or without records).
    pub pages_processed: usize,
}

impl DocumentRecords {
    pub fn push(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Records { pairs, .. } => {
                self.pages_processed += 1;
                self.pairs.extend(pairs);
            }
            PageOutcome::Fault(fault) => self.faults.push(fault),
        }
    }

    pub fn images_assigned(&self) -> usize {
        self.pairs.iter().filter(|p| p.has_image()).count()
    }
}

/// The record reconstruction engine: line assembly, grammar matching and
/// image correlation, configured once and applied page by page.
#[derive(Debug, Clone)]
pub struct RecordEngine {
    assembler: LineAssembler,
    matcher: RecordMatcher,
}

impl RecordEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, BlotterError> {
        validate_config(config)?;
        Ok(RecordEngine {
            assembler: LineAssembler::new(config.line_tolerance),
            matcher: RecordMatcher::new(&config.grammar)?,
        })
    }

    pub fn assembler(&self) -> &LineAssembler {
        &self.assembler
    }

    pub fn matcher(&self) -> &RecordMatcher {
        &self.matcher
    }

    /// Assemble the text lines of a page.
    pub fn lines(&self, page: &PageContent) -> Vec<Line> {
        self.assembler.assemble(page)
    }

    /// Extract the record/image pairs of a single page.
    pub fn process_page(&self, page: &PageContent) -> Vec<RecordImagePair> {
        let lines = self.assembler.assemble(page);
        let records = self.matcher.extract(&lines);
        if records.is_empty() {
            log::debug!(
                "page {}: {} lines, no record starts",
                page.page_number,
                lines.len()
            );
            return Vec::new();
        }

        let mode = CorrelationMode::select(&page.images);
        log::debug!(
            "page {}: {} lines, {} records, {} images, {:?} correlation",
            page.page_number,
            lines.len(),
            records.len(),
            page.images.len(),
            mode
        );

        correlate(records, page.images.clone())
            .into_iter()
            .map(|(record, image)| RecordImagePair {
                page_number: page.page_number,
                record,
                image,
            })
            .collect()
    }

    /// Lazily process pages in document order, stopping at the end of `range`.
    ///
    /// Pages before `range.first` are skipped; nothing after `range.last` is
    /// touched, so a caller can also stop consuming at any point and keep what
    /// it already has.
    pub fn pages<'a, I>(
        &'a self,
        pages: I,
        range: PageRange,
    ) -> impl Iterator<Item = PageOutcome> + 'a
    where
        I: IntoIterator<Item = PageExtraction>,
        I::IntoIter: 'a,
    {
        pages
            .into_iter()
            .take_while(move |page| !range.is_past(extraction_page_number(page)))
            .filter(move |page| range.contains(extraction_page_number(page)))
            .map(move |page| match page {
                Ok(content) => PageOutcome::Records {
                    page_number: content.page_number,
                    pairs: self.process_page(&content),
                },
                Err(fault) => {
                    log::warn!("skipping {}", fault);
                    PageOutcome::Fault(fault)
                }
            })
    }

    /// Process a whole document's pages and collect the results.
    pub fn process_pages<I>(&self, pages: I, range: PageRange) -> DocumentRecords
    where
        I: IntoIterator<Item = PageExtraction>,
    {
        let mut doc = DocumentRecords::default();
        for outcome in self.pages(pages, range) {
            doc.push(outcome);
        }
        doc
    }
}

fn extraction_page_number(page: &PageExtraction) -> usize {
    match page {
        Ok(content) => content.page_number,
        Err(fault) => fault.page_number,
    }
}

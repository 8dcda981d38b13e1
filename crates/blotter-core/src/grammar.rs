//! Line grammar for booking reports.
//!
//! A report page is a run of record-start rows ("name rows"), each followed
//! by the person's charge lines interleaved with layout noise: addresses,
//! the charge column header, pagination footers and blank rows.

use crate::config::GrammarConfig;
use crate::error::BlotterError;
use crate::model::{BookingRecord, Line};
use regex::Regex;

/// How a non-record-start line is treated while harvesting charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Address,
    ColumnHeader,
    PageFooter,
    Charge,
    Unclassified,
}

impl LineClass {
    pub fn label(&self) -> &'static str {
        match self {
            LineClass::Blank => "blank",
            LineClass::Address => "address",
            LineClass::ColumnHeader => "header",
            LineClass::PageFooter => "footer",
            LineClass::Charge => "charge",
            LineClass::Unclassified => "noise",
        }
    }
}

/// A record found on a page, with the top of its start line.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRecord {
    pub record: BookingRecord,
    pub top: f32,
}

/// Compiled form of a [`GrammarConfig`].
#[derive(Debug, Clone)]
pub struct RecordMatcher {
    record_start: Regex,
    address: Regex,
    column_header: String,
    page_footer_prefix: String,
    page_footer_infix: String,
    charge_prefix: String,
}

impl RecordMatcher {
    pub fn new(config: &GrammarConfig) -> Result<Self, BlotterError> {
        // a record start must span the whole line, whatever anchors the pattern has
        let record_start = Regex::new(&format!("^(?:{})$", config.record_start))?;

        let suffixes: Vec<String> = config
            .street_suffixes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();
        if suffixes.is_empty() {
            return Err(BlotterError::ConfigInvalid(
                "street_suffixes must not be empty".into(),
            ));
        }
        let address = Regex::new(&format!(r"(?i)^\d.*\b(?:{})\b", suffixes.join("|")))?;

        Ok(RecordMatcher {
            record_start,
            address,
            column_header: config.column_header.clone(),
            page_footer_prefix: config.page_footer_prefix.clone(),
            page_footer_infix: config.page_footer_infix.clone(),
            charge_prefix: config.charge_prefix.clone(),
        })
    }

    /// Parse a line as a record start.
    ///
    /// Returns `None` unless the whole (trimmed) line matches the grammar and
    /// every field is non-empty. The returned record has no charges yet.
    pub fn match_start(&self, line: &str) -> Option<BookingRecord> {
        let caps = self.record_start.captures(line.trim())?;
        let field = |name: &str| -> Option<String> {
            let value = caps.name(name)?.as_str().trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        Some(BookingRecord {
            name: field("name")?,
            booked_at: field("booked")?,
            date_of_birth: field("dob")?,
            gender: field("gender")?,
            brought_by: field("brought")?,
            charges: Vec::new(),
        })
    }

    /// Classify a line that follows a record start.
    pub fn classify(&self, line: &str) -> LineClass {
        let line = line.trim();

        if line.is_empty() {
            LineClass::Blank
        } else if self.address.is_match(line) {
            LineClass::Address
        } else if !self.column_header.is_empty() && line.starts_with(&self.column_header) {
            LineClass::ColumnHeader
        } else if self.is_page_footer(line) {
            LineClass::PageFooter
        } else if line.starts_with(&self.charge_prefix) {
            LineClass::Charge
        } else {
            LineClass::Unclassified
        }
    }

    fn is_page_footer(&self, line: &str) -> bool {
        !self.page_footer_prefix.is_empty()
            && line.starts_with(&self.page_footer_prefix)
            && line.contains(&self.page_footer_infix)
    }

    /// Extract all records from a page's lines, in line order.
    ///
    /// Each record collects the charge lines between its start line and the
    /// next start line (or the end of the page). Lines before the first start
    /// line belong to no record and are ignored.
    pub fn extract(&self, lines: &[Line]) -> Vec<MatchedRecord> {
        let mut records: Vec<MatchedRecord> = Vec::new();

        for line in lines {
            if let Some(record) = self.match_start(&line.text) {
                records.push(MatchedRecord {
                    record,
                    top: line.top,
                });
                continue;
            }

            let Some(current) = records.last_mut() else {
                continue;
            };
            match self.classify(&line.text) {
                LineClass::Charge => {
                    current.record.charges.push(line.text.trim().to_string())
                }
                class => log::trace!("dropped {} line: {:?}", class.label(), line.text),
            }
        }

        records
    }
}

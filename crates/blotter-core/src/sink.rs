//! Outbound interfaces: where extracted records go after a document is read.

use crate::error::BlotterError;
use crate::model::{BookingRecord, NameParts, RecordImagePair};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable storage for the records of one document.
pub trait RecordStore {
    fn store(&mut self, document_id: &str, pairs: &[RecordImagePair]) -> Result<(), BlotterError>;
}

/// Real-time delivery of individual records.
pub trait RecordNotifier {
    fn notify(&mut self, pair: &RecordImagePair) -> Result<(), BlotterError>;
}

/// A stored record, as written by [`DirectoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub page_number: usize,
    #[serde(flatten)]
    pub record: BookingRecord,
    pub name_parts: NameParts,
    pub charges_summary: String,
    /// File name of the mugshot next to the JSON file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    pub source_pdf: String,
}

/// Writes each document as `<id>.json` plus one PNG per mugshot.
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordStore for DirectoryStore {
    fn store(&mut self, document_id: &str, pairs: &[RecordImagePair]) -> Result<(), BlotterError> {
        std::fs::create_dir_all(&self.dir)?;
        let stem = file_stem(document_id);

        let mut stored = Vec::with_capacity(pairs.len());
        for (i, pair) in pairs.iter().enumerate() {
            let image_file = match &pair.image {
                Some(bytes) => {
                    let name = format!("{}-{:03}.png", stem, i + 1);
                    std::fs::write(self.dir.join(&name), bytes).map_err(|e| {
                        BlotterError::Store(format!("failed to write {name}: {e}"))
                    })?;
                    Some(name)
                }
                None => None,
            };
            stored.push(StoredRecord {
                page_number: pair.page_number,
                record: pair.record.clone(),
                name_parts: pair.record.name_parts(),
                charges_summary: pair.record.charges_summary(),
                image_file,
                source_pdf: document_id.to_string(),
            });
        }

        let json_path = self.dir.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&json_path, json).map_err(|e| {
            BlotterError::Store(format!("failed to write {}: {e}", json_path.display()))
        })?;

        log::info!(
            "stored {} records from {} in {}",
            stored.len(),
            document_id,
            self.dir.display()
        );
        Ok(())
    }
}

/// File-system safe stem for a document id such as "booking-2024-01-02.pdf".
fn file_stem(document_id: &str) -> String {
    let base = Path::new(document_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(document_id);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Writes a title line and the record description for each record.
pub struct TextNotifier<W: Write> {
    out: W,
}

impl<W: Write> TextNotifier<W> {
    pub fn new(out: W) -> Self {
        TextNotifier { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordNotifier for TextNotifier<W> {
    fn notify(&mut self, pair: &RecordImagePair) -> Result<(), BlotterError> {
        let mugshot = if pair.has_image() { "attached" } else { "none" };
        writeln!(self.out, "== {} ==", pair.record.name)?;
        writeln!(self.out, "{}", pair.record.describe())?;
        writeln!(self.out, "Mugshot: {mugshot}")?;
        writeln!(self.out)?;
        Ok(())
    }
}

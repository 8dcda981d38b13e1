use blotter_core::error::BlotterError;
use blotter_core::extraction::PdfExtractor;
use blotter_core::sink::{DirectoryStore, RecordNotifier, RecordStore, TextNotifier};
use blotter_core::{DocumentRecords, PageRange, RecordEngine};
use std::path::{Path, PathBuf};

use crate::output;

pub struct ExtractOptions {
    pub output_format: String,
    pub out_dir: Option<PathBuf>,
    pub notify: bool,
    pub range: PageRange,
}

pub fn run(
    inputs: Vec<PathBuf>,
    options: ExtractOptions,
    config_file: Option<PathBuf>,
) -> Result<(), BlotterError> {
    let (engine, extractor) = super::setup(config_file.as_deref())?;
    let files = collect_pdfs(&inputs)?;
    if files.is_empty() {
        return Err(BlotterError::Extraction("no PDF files found".into()));
    }

    let mut documents = Vec::with_capacity(files.len());
    let mut failed = 0;
    for file in &files {
        let document_id = document_id(file);
        match extract_one(file, &document_id, &extractor, &engine, &options) {
            Ok(doc) => documents.push((document_id, doc)),
            Err(e) => {
                eprintln!("FAILED {}: {e}", file.display());
                failed += 1;
            }
        }
    }

    match options.output_format.as_str() {
        "json" => output::json::print(&documents, is_single_file(&inputs, &files))?,
        _ => output::table::print(&documents),
    }

    if failed > 0 {
        return Err(BlotterError::Extraction(format!(
            "{failed} of {} document(s) failed",
            files.len()
        )));
    }
    Ok(())
}

fn extract_one(
    file: &Path,
    document_id: &str,
    extractor: &dyn PdfExtractor,
    engine: &RecordEngine,
    options: &ExtractOptions,
) -> Result<DocumentRecords, BlotterError> {
    let pdf_bytes = std::fs::read(file)?;
    let doc = blotter_core::extract_records(&pdf_bytes, extractor, engine, options.range)?;

    // stdout carries the table or JSON document
    if options.notify {
        let mut notifier = TextNotifier::new(std::io::stderr().lock());
        for pair in &doc.pairs {
            notifier.notify(pair)?;
        }
    }

    if let Some(dir) = &options.out_dir {
        let mut store = DirectoryStore::new(dir);
        store.store(document_id, &doc.pairs)?;
        eprintln!(
            "Stored {} record(s) from {} in {}",
            doc.pairs.len(),
            document_id,
            store.dir().display()
        );
    }

    if !doc.faults.is_empty() {
        eprintln!(
            "{}: {} page(s) could not be read:",
            document_id,
            doc.faults.len()
        );
        for fault in &doc.faults {
            eprintln!("  {fault}");
        }
    }

    Ok(doc)
}

/// A single file argument keeps the single-document JSON shape.
fn is_single_file(inputs: &[PathBuf], files: &[PathBuf]) -> bool {
    inputs.len() == 1 && files.len() == 1 && inputs[0] == files[0]
}

/// Expand the inputs into PDF files. Directories contribute their `*.pdf`
/// entries in name order; plain files are taken as given.
fn collect_pdfs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, BlotterError> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_pdf(path))
            .collect();
        found.sort();
        log::debug!("{}: {} PDF file(s)", input.display(), found.len());
        files.extend(found);
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn document_id(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_inputs_expand_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["booking-2024-01-03.pdf", "booking-2024-01-01.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("archive.pdf")).unwrap();

        let files = collect_pdfs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files.iter().map(|f| document_id(f)).collect();
        assert_eq!(names, vec!["booking-2024-01-01.PDF", "booking-2024-01-03.pdf"]);
    }

    #[test]
    fn test_file_inputs_are_kept_as_given() {
        let files = collect_pdfs(&[PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]).unwrap();
        assert_eq!(files, vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]);
        assert!(is_single_file(&files[..1], &files[..1]));
    }

    #[test]
    fn test_document_id_is_file_name() {
        assert_eq!(document_id(Path::new("/srv/new/booking.pdf")), "booking.pdf");
    }
}

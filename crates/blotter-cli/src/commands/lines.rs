use blotter_core::error::BlotterError;
use blotter_core::extraction::PdfExtractor;
use std::path::PathBuf;

pub fn run(
    pdf_file: PathBuf,
    page: Option<usize>,
    config_file: Option<PathBuf>,
) -> Result<(), BlotterError> {
    let (engine, extractor) = super::setup(config_file.as_deref())?;
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let pages = extractor.extract_pages(&pdf_bytes)?;

    for extracted in pages {
        let content = match extracted {
            Ok(content) => content,
            Err(fault) => {
                if page.map_or(true, |p| p == fault.page_number) {
                    eprintln!("  skipped {fault}");
                }
                continue;
            }
        };
        if page.is_some_and(|p| p != content.page_number) {
            continue;
        }

        println!(
            "--- Page {} ({} tokens, {} images, tolerance {}) ---",
            content.page_number,
            content.tokens.len(),
            content.images.len(),
            engine.assembler().tolerance()
        );
        for line in engine.lines(&content) {
            match engine.matcher().match_start(&line.text) {
                Some(record) => {
                    println!("{:>8.1}  {:<7} {}", line.top, "start", line.text);
                    println!("{:>8}  {:<7} => {}", "", "", record);
                }
                None => {
                    let label = engine.matcher().classify(&line.text).label();
                    println!("{:>8.1}  {:<7} {}", line.top, label, line.text);
                }
            }
        }
        println!();
    }

    Ok(())
}

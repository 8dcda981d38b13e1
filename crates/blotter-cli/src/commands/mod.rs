pub mod config;
pub mod extract;
pub mod lines;

use blotter_core::config::{load_config, EngineConfig};
use blotter_core::error::BlotterError;
use blotter_core::extraction::poppler::PopplerExtractor;
use blotter_core::RecordEngine;
use std::path::Path;

/// Load the config file, or the defaults when none is given.
pub fn load(config_file: Option<&Path>) -> Result<EngineConfig, BlotterError> {
    match config_file {
        Some(path) => load_config(path),
        None => Ok(EngineConfig::default()),
    }
}

/// The engine and the poppler document source, both built from one config.
///
/// Fails with an install hint when pdftotext is missing.
pub fn setup(
    config_file: Option<&Path>,
) -> Result<(RecordEngine, PopplerExtractor), BlotterError> {
    let config = load(config_file)?;
    let engine = RecordEngine::new(&config)?;
    if !PopplerExtractor::is_available() {
        return Err(BlotterError::PdftotextNotFound);
    }
    Ok((engine, PopplerExtractor::with_config(config.poppler)))
}

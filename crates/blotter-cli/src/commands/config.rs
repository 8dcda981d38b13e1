use blotter_core::error::BlotterError;
use std::path::PathBuf;

/// Print the effective config: the file's settings over the defaults.
pub fn print(config_file: Option<PathBuf>) -> Result<(), BlotterError> {
    let config = super::load(config_file.as_deref())?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}

use crate::error::BlotterError;
use crate::extraction::poppler::PopplerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named capture groups the record-start pattern must define.
pub const RECORD_FIELDS: &[&str] = &["name", "booked", "dob", "gender", "brought"];

pub const DEFAULT_RECORD_START: &str = concat!(
    r"^(?P<name>[A-Z ,'\-]+)\s+",
    r"(?P<booked>\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}:\d{2}\s+[AP]M)\s+",
    r"(?P<dob>\d{1,2}/\d{1,2}/\d{4})\s+",
    r"(?P<gender>[A-Z]+)\s+",
    r"(?P<brought>.+)$"
);

/// Settings for the whole record engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum vertical distance from a row's first token for a token to join that row.
    pub line_tolerance: f32,
    pub grammar: GrammarConfig,
    /// Image placement settings for the poppler document source.
    pub poppler: PopplerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            line_tolerance: 3.0,
            grammar: GrammarConfig::default(),
            poppler: PopplerConfig::default(),
        }
    }
}

/// The booking-report line grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Full-line pattern for a record start, with the groups in [`RECORD_FIELDS`].
    pub record_start: String,
    /// Street suffix words that mark a digit-led line as an address.
    pub street_suffixes: Vec<String>,
    pub column_header: String,
    pub page_footer_prefix: String,
    pub page_footer_infix: String,
    pub charge_prefix: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            record_start: DEFAULT_RECORD_START.to_string(),
            street_suffixes: ["AVE", "ST", "RD", "DR", "BLVD", "WAY", "CT", "PL", "LN", "CIR"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            column_header: "Charge Description".to_string(),
            page_footer_prefix: "Page ".to_string(),
            page_footer_infix: " of ".to_string(),
            charge_prefix: "State ".to_string(),
        }
    }
}

/// Load an engine config from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, BlotterError> {
    let content = std::fs::read_to_string(path).map_err(|e| BlotterError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|e| BlotterError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an engine config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, BlotterError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is usable before any page is processed.
pub fn validate_config(config: &EngineConfig) -> Result<(), BlotterError> {
    if !config.line_tolerance.is_finite() || config.line_tolerance < 0.0 {
        return Err(BlotterError::ConfigInvalid(format!(
            "line_tolerance must be a non-negative number, got {}",
            config.line_tolerance
        )));
    }

    let grammar = &config.grammar;
    let pattern = regex::Regex::new(&grammar.record_start)?;
    let names: Vec<&str> = pattern.capture_names().flatten().collect();
    for field in RECORD_FIELDS {
        if !names.contains(field) {
            return Err(BlotterError::ConfigInvalid(format!(
                "record_start pattern is missing the named group '{}'",
                field
            )));
        }
    }

    if grammar.street_suffixes.iter().all(|s| s.trim().is_empty()) {
        return Err(BlotterError::ConfigInvalid(
            "street_suffixes must not be empty".into(),
        ));
    }

    if grammar.charge_prefix.is_empty() {
        return Err(BlotterError::ConfigInvalid(
            "charge_prefix must not be empty".into(),
        ));
    }

    let poppler = &config.poppler;
    if !poppler.render_zoom.is_finite() || poppler.render_zoom <= 0.0 {
        return Err(BlotterError::ConfigInvalid(format!(
            "poppler.render_zoom must be positive, got {}",
            poppler.render_zoom
        )));
    }
    for (name, value) in [
        ("min_image_size", poppler.min_image_size),
        ("header_band", poppler.header_band),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(BlotterError::ConfigInvalid(format!(
                "poppler.{name} must be a non-negative number, got {value}"
            )));
        }
    }

    Ok(())
}

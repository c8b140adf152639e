use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::processor::{resolve_encoding, MarkerResolutionStrategy};

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SIGNBOOK_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Where the service looks for its config: `$SIGNBOOK_CONFIG`, else
/// `config/config.json` relative to the working directory.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    for (name, dir) in [
        ("input_directory", &config.input_directory),
        ("output_directory", &config.output_directory),
        ("processed_directory", &config.processed_directory),
        ("error_directory", &config.error_directory),
    ] {
        if dir.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{} must not be empty", name),
            });
        }
    }

    if let Err(e) = regex::Regex::new(&config.input_file_pattern) {
        return Err(ConfigError::InvalidPattern {
            pattern: config.input_file_pattern.clone(),
            reason: e.to_string(),
        });
    }

    for label in [&config.encoding.input, &config.encoding.output] {
        if resolve_encoding(label).is_err() {
            return Err(ConfigError::UnknownEncoding(label.clone()));
        }
    }

    if config.polling_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "polling_interval_ms must be greater than 0".to_string(),
        });
    }

    if config.temp_extension == config.final_extension {
        return Err(ConfigError::Validation {
            message: "temp_extension and final_extension must differ".to_string(),
        });
    }

    match &config.marker.strategy {
        MarkerResolutionStrategy::FixedMarker { marker } if marker.is_empty() => {
            return Err(ConfigError::Validation {
                message: "Fixed page-break marker must not be empty".to_string(),
            });
        }
        MarkerResolutionStrategy::DetectedFromCatalog { detect_lines } if *detect_lines == 0 => {
            return Err(ConfigError::Validation {
                message: "detect_lines must be greater than 0".to_string(),
            });
        }
        _ => {}
    }

    Ok(())
}

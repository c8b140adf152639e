use std::path::PathBuf;

use encoding_rs::Encoding;

use crate::config::Config;
use crate::error::ConfigError;
use crate::processor::{resolve_encoding, MarkerResolutionStrategy, MatchMode};
use crate::storage::OutputSettings;

pub struct PipelineConfig {
    pub input_directory: PathBuf,
    pub input_file_pattern: String,
    pub input_encoding: &'static Encoding,
    pub output: OutputSettings,
    pub processed_directory: PathBuf,
    pub error_directory: PathBuf,
    pub marker_strategy: MarkerResolutionStrategy,
    pub match_mode: MatchMode,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let encoding = |label: &String| {
            resolve_encoding(label).map_err(|_| ConfigError::UnknownEncoding(label.clone()))
        };

        Ok(Self {
            input_directory: config.input_path(),
            input_file_pattern: config.input_file_pattern.clone(),
            input_encoding: encoding(&config.encoding.input)?,
            output: OutputSettings {
                directory: config.output_path(),
                temp_extension: config.temp_extension.clone(),
                final_extension: config.final_extension.clone(),
                encoding: encoding(&config.encoding.output)?,
                page_separator: config.page_separator.clone(),
            },
            processed_directory: config.processed_path(),
            error_directory: config.error_path(),
            marker_strategy: config.marker.strategy.clone(),
            match_mode: config.marker.match_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_from_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "input_directory": "/in",
                "output_directory": "/out",
                "processed_directory": "/done",
                "error_directory": "/err",
                "encoding": { "input": "ISO-8859-1", "output": "UTF-8" },
                "marker": { "strategy": "stored", "match_mode": "contains" }
            }"#,
        )
        .unwrap();

        let pipeline_config = PipelineConfig::from_config(&config).unwrap();
        assert_eq!(pipeline_config.input_directory, PathBuf::from("/in"));
        assert_eq!(pipeline_config.output.directory, PathBuf::from("/out"));
        assert_eq!(pipeline_config.input_encoding, encoding_rs::WINDOWS_1252);
        assert_eq!(pipeline_config.output.encoding, encoding_rs::UTF_8);
        assert_eq!(
            pipeline_config.marker_strategy,
            MarkerResolutionStrategy::StoredOnDocument
        );
        assert_eq!(pipeline_config.match_mode, MatchMode::Contains);
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::processor::{MatchMode, MarkerResolutionStrategy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub input_directory: String,
    pub output_directory: String,
    pub processed_directory: String,
    pub error_directory: String,
    /// Regex a source file name must fully match.
    #[serde(default = "default_file_pattern")]
    pub input_file_pattern: String,
    #[serde(default = "default_temp_extension")]
    pub temp_extension: String,
    #[serde(default = "default_final_extension")]
    pub final_extension: String,
    /// Line written between pages in the output file.
    #[serde(default = "default_page_separator")]
    pub page_separator: String,
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default)]
    pub marker: MarkerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_file_pattern() -> String {
    ".*".to_string()
}

fn default_temp_extension() -> String {
    ".tmp".to_string()
}

fn default_final_extension() -> String {
    ".txt".to_string()
}

fn default_page_separator() -> String {
    "1".to_string()
}

fn default_polling_interval_ms() -> u64 {
    10_000
}

impl Config {
    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.input_directory)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_directory)
    }

    pub fn processed_path(&self) -> PathBuf {
        PathBuf::from(&self.processed_directory)
    }

    pub fn error_path(&self) -> PathBuf {
        PathBuf::from(&self.error_directory)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    #[serde(default = "default_input_encoding")]
    pub input: String,
    #[serde(default = "default_output_encoding")]
    pub output: String,
}

fn default_input_encoding() -> String {
    "ISO-8859-1".to_string()
}

fn default_output_encoding() -> String {
    "UTF-8".to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            input: default_input_encoding(),
            output: default_output_encoding(),
        }
    }
}

/// The strategy fields sit next to `match_mode` in one object. Without a
/// `strategy` key the object describes a fixed marker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkerConfig {
    #[serde(flatten)]
    pub strategy: MarkerResolutionStrategy,
    pub match_mode: MatchMode,
}

impl<'de> serde::Deserialize<'de> for MarkerConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde_json::Value;

        let Value::Object(mut map) = Value::deserialize(deserializer)? else {
            return Err(D::Error::custom("marker must be an object"));
        };

        let match_mode = match map.remove("match_mode") {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("Invalid match_mode: {}", e)))?,
            None => MatchMode::default(),
        };

        map.entry("strategy")
            .or_insert_with(|| Value::String("fixed".to_string()));
        let strategy = serde_json::from_value(Value::Object(map))
            .map_err(|e| D::Error::custom(format!("Invalid marker strategy: {}", e)))?;

        Ok(Self {
            strategy,
            match_mode,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string (`sqlite://path`, a bare path, or `:memory:`).
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable that overrides `url` when set.
    #[serde(default = "default_url_env")]
    pub url_env: String,
}

fn default_url_env() -> String {
    "DB_URL".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: default_url_env(),
        }
    }
}

impl DatabaseConfig {
    /// The effective connection string: the environment override, then the
    /// configured url. `None` means the default database path.
    pub fn resolve_url(&self) -> Option<String> {
        std::env::var(&self.url_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.url.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

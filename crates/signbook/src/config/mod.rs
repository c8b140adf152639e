pub mod loader;
pub mod schema;

pub use loader::{config_path, load_config, load_config_from_str};
pub use schema::{
    Config, DatabaseConfig, EncodingConfig, LogFormat, LogLevel, LoggingConfig, MarkerConfig,
};

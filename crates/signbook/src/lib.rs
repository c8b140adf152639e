pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod service;
pub mod storage;
pub mod store;
pub mod worker;

pub use config::{config_path, load_config, Config};
pub use db::{Database, DatabaseError, DocumentStatus};
pub use error::{ConfigError, ProcessError, Result, SignbookError, StorageError, WorkerError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError};
pub use processor::{MarkerResolutionStrategy, MatchMode, PageSplitter};
pub use service::Service;
pub use store::DocumentStore;

//! The long-lived ingestion service: database, pipeline and scheduler wired
//! together from a loaded `Config`.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};
use tokio::sync::broadcast;

use crate::config::Config;
use crate::db::{document_repo, Database, DocumentStatus};
use crate::error::{ConfigError, Result};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::sanitize;
use crate::storage::filesystem::ensure_directory;
use crate::worker::{CycleOutcome, IngestTask, IntervalScheduler};

pub struct Service {
    database: Database,
    pipeline: Arc<Pipeline>,
    scheduler: IntervalScheduler<IngestTask>,
    trigger_tx: broadcast::Sender<()>,
}

impl Service {
    /// Opens the configured database and builds the pipeline and scheduler.
    pub fn from_config(config: &Config) -> Result<Self> {
        let database = match config.database.resolve_url() {
            Some(url) => {
                info!("Using database {}", sanitize::redact_database_url(&url));
                Database::open_url(&url)?
            }
            None => {
                let path = crate::db::default_database_path().ok_or_else(|| {
                    ConfigError::Validation {
                        message: "No database url configured and no home directory found"
                            .to_string(),
                    }
                })?;
                info!("Using database {}", sanitize::redact_path(&path));
                Database::open(&path)?
            }
        };

        Self::with_database(config, database)
    }

    /// Builds the service around an already opened database.
    pub fn with_database(config: &Config, database: Database) -> Result<Self> {
        for dir in [
            config.input_path(),
            config.output_path(),
            config.processed_path(),
            config.error_path(),
        ] {
            ensure_directory(&dir)?;
        }

        let pipeline_config = PipelineConfig::from_config(config)?;
        let pipeline = Arc::new(Pipeline::from_config(Arc::new(pipeline_config))?);
        let task = IngestTask::new(Arc::new(database.clone()), Arc::clone(&pipeline));
        let scheduler = IntervalScheduler::new(Arc::new(task), config.polling_interval());
        let (trigger_tx, _) = broadcast::channel(16);

        Ok(Self {
            database,
            pipeline,
            scheduler,
            trigger_tx,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Logs the pending documents and the matching files waiting in the
    /// input directory.
    pub fn log_backlog(&self) {
        match document_repo::count_by_status(&self.database, DocumentStatus::ToProcess) {
            Ok(count) => info!("{} documents waiting to be processed", count),
            Err(e) => warn!("Failed to count pending documents: {}", e),
        }
        if let Err(e) = self.pipeline.scanner().scan() {
            warn!("Failed to scan input directory: {}", e);
        }
    }

    /// Starts the polling loop on its own thread.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        Ok(self.scheduler.start(self.trigger_tx.subscribe())?)
    }

    /// Runs one cycle now on the calling thread.
    pub fn run_once(&self) -> CycleOutcome {
        self.scheduler.run_now()
    }

    /// Wakes the polling loop for an immediate cycle.
    pub fn trigger(&self) {
        // no receiver means the loop is not running
        let _ = self.trigger_tx.send(());
    }

    /// Stops the polling loop once the running cycle, if any, has finished.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.trigger();
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, info_span, warn};

use crate::db::{ActivityRow, DocumentRow, DocumentStatus, PageRow};
use crate::error::ConfigError;
use crate::processor::{LineReader, PageSplitter, SplitError};
use crate::sanitize;
use crate::storage::{FileLifecycle, TempOutput};
use crate::store::DocumentStore;
use crate::worker::job::{Job, JobResult};
use crate::worker::DirectoryScanner;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;

/// Activity action recorded for every split attempt.
pub const SPLIT_ACTION: &str = "split";

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    scanner: DirectoryScanner,
    lifecycle: FileLifecycle,
}

impl Pipeline {
    pub fn from_config(config: Arc<PipelineConfig>) -> Result<Self, ConfigError> {
        let scanner = DirectoryScanner::new(&config.input_directory, &config.input_file_pattern)?;
        let lifecycle = FileLifecycle::new(&config.processed_directory, &config.error_directory);

        Ok(Self {
            config,
            scanner,
            lifecycle,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scanner(&self) -> &DirectoryScanner {
        &self.scanner
    }

    /// Splits one already claimed document and records the outcome on it.
    ///
    /// Never fails: errors end up in the document's status and activity log
    /// and in the returned `JobResult`.
    pub fn process(&self, document: &DocumentRow, store: &dyn DocumentStore) -> JobResult {
        let mut ctx = PipelineContext::new(Job::for_document(document));
        let filename = sanitize::redact_path(Path::new(&document.filename));
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            document_id = %document.id,
            filename = %filename,
        )
        .entered();

        match self.run_steps(document, store, &mut ctx) {
            Ok((output_path, archive_path)) => {
                let _step = info_span!("record_success").entered();
                self.step_record_success(&ctx, store);
                info!(
                    "Document {} split into {} pages",
                    document.id, ctx.pages
                );
                JobResult::success(&ctx.job, ctx.pages, output_path, archive_path)
            }
            Err(e) => {
                let _step = info_span!("record_failure").entered();
                warn!("Document {} failed: {}", document.id, e);
                self.step_record_failure(&mut ctx, store, &e);
                JobResult::failure(&ctx.job, ctx.archive_path.clone(), e.to_string())
            }
        }
    }

    fn run_steps(
        &self,
        document: &DocumentRow,
        store: &dyn DocumentStore,
        ctx: &mut PipelineContext,
    ) -> Result<(PathBuf, PathBuf), PipelineError> {
        // Step 1: Locate the source file
        let source_path = {
            let _step = info_span!("resolve_source").entered();
            let path = self.scanner.resolve(&document.filename)?;
            ctx.source_path = Some(path.clone());
            path
        };

        // Step 2: Resolve the page-break marker
        let marker = {
            let _step = info_span!("resolve_marker").entered();
            let resolved = self.config.marker_strategy.resolve(
                document,
                store,
                &source_path,
                self.config.input_encoding,
            )?;
            debug!(
                "Using page break '{}' (detected: {})",
                resolved.marker, resolved.detected
            );
            ctx.marker = Some(resolved.clone());
            resolved.marker
        };

        // Step 3: Split into pages and the temporary output
        let output_path = {
            let _step = info_span!("split_pages").entered();
            self.step_split(&source_path, &marker, store, ctx)?
        };

        // Step 4: Archive the source
        let archive_path = {
            let _step = info_span!("archive_source").entered();
            let path = self
                .lifecycle
                .move_to_processed(&source_path, &ctx.job.generated_name)
                .map_err(PipelineError::Archive)?;
            ctx.archive_path = Some(path.clone());
            path
        };

        Ok((output_path, archive_path))
    }

    fn step_split(
        &self,
        source_path: &Path,
        marker: &str,
        store: &dyn DocumentStore,
        ctx: &mut PipelineContext,
    ) -> Result<PathBuf, PipelineError> {
        let splitter = PageSplitter::new(marker, self.config.match_mode);
        let mut output = TempOutput::create(&self.config.output, &ctx.job.generated_name)?;
        let document_id = ctx.job.document_id.as_str();

        let split = LineReader::open(source_path, self.config.input_encoding)
            .map_err(PipelineError::from)
            .and_then(|reader| {
                splitter
                    .split(reader, |page| -> Result<(), PipelineError> {
                        output.write_page(&page)?;
                        debug!("Page {} has {} lines", page.number, page.lines.len());
                        store.insert_page(&PageRow::new(document_id, page.number, page.lines))?;
                        Ok(())
                    })
                    .map_err(|e| match e {
                        SplitError::Read(source) => PipelineError::ReadLine {
                            path: source_path.to_path_buf(),
                            source,
                        },
                        SplitError::Emit { source, .. } => source,
                    })
            });

        match split {
            Ok(pages) => {
                let output_path = output.finalize()?;
                ctx.pages = pages;
                ctx.output_path = Some(output_path.clone());
                Ok(output_path)
            }
            Err(e) => {
                if let Err(cleanup) = output.discard() {
                    warn!("Failed to discard temporary output: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    fn step_record_success(&self, ctx: &PipelineContext, store: &dyn DocumentStore) {
        let id = &ctx.job.document_id;

        if let Err(e) = store.set_occurrences(id, ctx.pages) {
            warn!("Failed to record page count for {}: {}", id, e);
        }
        if let Err(e) = store.set_status(id, DocumentStatus::FinishedOk) {
            warn!("Failed to mark {} as finished: {}", id, e);
        }

        let activity = ActivityRow {
            action: SPLIT_ACTION.to_string(),
            start_time: ctx.job.started_at.to_rfc3339(),
            end_time: Local::now().to_rfc3339(),
            filename: Some(ctx.job.generated_name.clone()),
            status: DocumentStatus::FinishedOk,
            occurrences: ctx.pages,
            error_description: String::new(),
        };
        if let Err(e) = store.append_activity(id, &activity) {
            warn!("Failed to append activity for {}: {}", id, e);
        }
    }

    fn step_record_failure(
        &self,
        ctx: &mut PipelineContext,
        store: &dyn DocumentStore,
        error: &PipelineError,
    ) {
        let id = ctx.job.document_id.clone();

        if let Some(source_path) = ctx.source_path.as_deref().filter(|p| p.exists()) {
            match self
                .lifecycle
                .move_to_error(source_path, &ctx.job.generated_name)
            {
                Ok(path) => ctx.archive_path = Some(path),
                Err(e) => warn!("Failed to move {} to error directory: {}", id, e),
            }
        }

        if let Err(e) = store.set_status(&id, DocumentStatus::Error) {
            warn!("Failed to mark {} as failed: {}", id, e);
        }

        let activity = ActivityRow {
            action: SPLIT_ACTION.to_string(),
            start_time: ctx.job.started_at.to_rfc3339(),
            end_time: Local::now().to_rfc3339(),
            filename: ctx
                .archive_path
                .as_ref()
                .map(|_| ctx.job.generated_name.clone()),
            status: DocumentStatus::Error,
            occurrences: ctx.pages,
            error_description: error.to_string(),
        };
        if let Err(e) = store.append_activity(&id, &activity) {
            warn!("Failed to append activity for {}: {}", id, e);
        }
    }
}

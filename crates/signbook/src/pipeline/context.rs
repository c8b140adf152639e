use std::path::PathBuf;

use crate::processor::ResolvedMarker;
use crate::worker::job::Job;

/// State accumulated while one job moves through the pipeline steps.
pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 result
    pub source_path: Option<PathBuf>,

    // Step 2 result
    pub marker: Option<ResolvedMarker>,

    // Step 3 results
    pub pages: u64,
    pub output_path: Option<PathBuf>,

    // Step 4 result, or the error directory copy on failure
    pub archive_path: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            source_path: None,
            marker: None,
            pages: 0,
            output_path: None,
            archive_path: None,
        }
    }
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::db::DocumentRow;
use crate::storage::generated_name;

/// One processing attempt of a claimed document.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub document_id: String,
    /// File name as recorded on the document.
    pub filename: String,
    /// Name the source file is relocated under once the attempt ends.
    pub generated_name: String,
    pub started_at: DateTime<Local>,
}

impl Job {
    pub fn for_document(document: &DocumentRow) -> Self {
        Self::for_document_at(document, Local::now())
    }

    pub fn for_document_at(document: &DocumentRow, at: DateTime<Local>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            generated_name: generated_name(at, Path::new(&document.filename)),
            started_at: at,
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub document_id: String,
    pub success: bool,
    /// Number of pages produced.
    pub pages: u64,
    pub output_path: Option<PathBuf>,
    /// Where the source file ended up (processed or error directory).
    pub archive_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(job: &Job, pages: u64, output_path: PathBuf, archive_path: PathBuf) -> Self {
        Self {
            job_id: job.id.clone(),
            document_id: job.document_id.clone(),
            success: true,
            pages,
            output_path: Some(output_path),
            archive_path: Some(archive_path),
            error: None,
        }
    }

    pub fn failure(job: &Job, archive_path: Option<PathBuf>, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            document_id: job.document_id.clone(),
            success: false,
            pages: 0,
            output_path: None,
            archive_path,
            error: Some(error),
        }
    }
}

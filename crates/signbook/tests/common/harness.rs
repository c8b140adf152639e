//! Test harness for isolated ingestion runs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use signbook::config::Config;
use signbook::db::{book_repo, document_repo, page_repo, ActivityRow, BookRow, DocumentRow};
use signbook::worker::{CycleReport, IngestTask, JobResult, ScheduledTask};
use signbook::{Database, DocumentStore, Pipeline, PipelineConfig, Service};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub error_dir: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let input_dir = base.join("input");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        Self {
            input_dir,
            output_dir: base.join("output"),
            processed_dir: base.join("processed"),
            error_dir: base.join("error"),
            db: Database::open_in_memory().expect("Failed to open database"),
            temp_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A config builder pointing at this harness's directories.
    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new(self.temp_dir.path())
    }

    pub fn write_input(&self, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    /// Joins `lines` with `\n` (plus a trailing newline) and writes them.
    pub fn write_lines(&self, filename: &str, lines: &[&str]) -> PathBuf {
        let mut content = lines.join("\n");
        content.push('\n');
        self.write_input(filename, content.as_bytes())
    }

    /// Registers a pending document for an input file.
    pub fn seed_document(&self, id: &str, filename: &str) -> DocumentRow {
        let doc = DocumentRow::pending(id, filename);
        document_repo::insert(&self.db, &doc).expect("Failed to insert document");
        doc
    }

    pub fn seed_book(&self, id: &str, page_break: &str) {
        book_repo::insert(&self.db, &BookRow::new(id, page_break)).expect("Failed to insert book");
    }

    pub fn pipeline(&self, config: &Config) -> Pipeline {
        let pipeline_config =
            PipelineConfig::from_config(config).expect("Failed to build pipeline config");
        Pipeline::from_config(Arc::new(pipeline_config)).expect("Failed to build pipeline")
    }

    /// Claims and processes a single document.
    pub fn process(&self, config: &Config, doc: &DocumentRow) -> JobResult {
        assert!(self.db.claim(&doc.id).expect("claim failed"), "document was not pending");
        self.pipeline(config).process(doc, &self.db)
    }

    /// Runs one ingestion cycle over every pending document.
    pub fn run_cycle(&self, config: &Config) -> CycleReport {
        let task = IngestTask::new(Arc::new(self.db.clone()), Arc::new(self.pipeline(config)));
        task.run_cycle()
    }

    pub fn service(&self, config: &Config) -> Service {
        Service::with_database(config, self.db.clone()).expect("Failed to build service")
    }

    pub fn document(&self, id: &str) -> DocumentRow {
        document_repo::find_by_id(&self.db, id)
            .expect("query failed")
            .expect("document not found")
    }

    pub fn pages(&self, id: &str) -> Vec<Vec<String>> {
        page_repo::list_for_document(&self.db, id)
            .expect("query failed")
            .into_iter()
            .map(|p| p.lines)
            .collect()
    }

    pub fn activity(&self, id: &str) -> Vec<ActivityRow> {
        document_repo::list_activity(&self.db, id).expect("query failed")
    }

    /// Sorted file names directly inside `dir`; empty if it does not exist.
    pub fn files_in(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.expect("bad dir entry").file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

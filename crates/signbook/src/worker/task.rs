use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::pipeline::Pipeline;
use crate::store::DocumentStore;

/// Tally of one scheduler cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub failed: usize,
    /// Documents another worker claimed first, or whose claim failed.
    pub skipped: usize,
}

/// Work run once per scheduler tick. A cycle never fails; problems are
/// logged and reflected in the report.
pub trait ScheduledTask: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn run_cycle(&self) -> CycleReport;
}

/// Claims and splits every pending document, one at a time.
pub struct IngestTask {
    store: Arc<dyn DocumentStore>,
    pipeline: Arc<Pipeline>,
}

impl IngestTask {
    pub fn new(store: Arc<dyn DocumentStore>, pipeline: Arc<Pipeline>) -> Self {
        Self { store, pipeline }
    }
}

impl ScheduledTask for IngestTask {
    fn name(&self) -> &str {
        "ingest"
    }

    fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let pending = match self.store.find_pending() {
            Ok(pending) => pending,
            Err(e) => {
                error!("Failed to query pending documents: {}", e);
                return report;
            }
        };

        if pending.is_empty() {
            info!("no documents to process");
            return report;
        }

        debug!("{} documents pending", pending.len());

        for document in pending {
            match self.store.claim(&document.id) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Document {} already claimed, skipping", document.id);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Failed to claim document {}: {}", document.id, e);
                    report.skipped += 1;
                    continue;
                }
            }

            let result = self.pipeline.process(&document, self.store.as_ref());
            if result.success {
                report.processed += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            "Cycle finished: {} processed, {} failed, {} skipped",
            report.processed, report.failed, report.skipped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        document_repo, ActivityRow, BookRow, Database, DatabaseError, DocumentRow,
        DocumentStatus, PageRow,
    };
    use crate::pipeline::PipelineConfig;
    use crate::processor::{MarkerResolutionStrategy, MatchMode};
    use crate::storage::OutputSettings;
    use tempfile::TempDir;

    fn pipeline(root: &TempDir) -> Arc<Pipeline> {
        let config = PipelineConfig {
            input_directory: root.path().join("input"),
            input_file_pattern: ".*".to_string(),
            input_encoding: encoding_rs::UTF_8,
            output: OutputSettings {
                directory: root.path().join("output"),
                temp_extension: ".tmp".to_string(),
                final_extension: ".txt".to_string(),
                encoding: encoding_rs::UTF_8,
                page_separator: "1".to_string(),
            },
            processed_directory: root.path().join("processed"),
            error_directory: root.path().join("error"),
            marker_strategy: MarkerResolutionStrategy::default(),
            match_mode: MatchMode::Exact,
        };
        Arc::new(Pipeline::from_config(Arc::new(config)).unwrap())
    }

    fn task(root: &TempDir, db: &Database) -> IngestTask {
        IngestTask::new(Arc::new(db.clone()), pipeline(root))
    }

    /// Delegates to a database, failing the listing or the claim of one
    /// document on demand.
    struct FlakyStore {
        db: Database,
        fail_pending: bool,
        fail_claim: Option<&'static str>,
        /// Claimed by another worker right before this one tries.
        taken: Option<&'static str>,
    }

    impl DocumentStore for FlakyStore {
        fn find_pending(&self) -> Result<Vec<DocumentRow>, DatabaseError> {
            if self.fail_pending {
                return Err(DatabaseError::LockPoisoned);
            }
            self.db.find_pending()
        }
        fn find_document(&self, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
            self.db.find_document(id)
        }
        fn claim(&self, id: &str) -> Result<bool, DatabaseError> {
            if self.fail_claim == Some(id) {
                return Err(DatabaseError::LockPoisoned);
            }
            if self.taken == Some(id) {
                self.db.claim(id)?;
            }
            self.db.claim(id)
        }
        fn set_status(&self, id: &str, status: DocumentStatus) -> Result<(), DatabaseError> {
            self.db.set_status(id, status)
        }
        fn set_page_break(&self, id: &str, marker: &str) -> Result<(), DatabaseError> {
            self.db.set_page_break(id, marker)
        }
        fn set_occurrences(&self, id: &str, count: u64) -> Result<(), DatabaseError> {
            self.db.set_occurrences(id, count)
        }
        fn append_activity(&self, id: &str, entry: &ActivityRow) -> Result<(), DatabaseError> {
            self.db.append_activity(id, entry)
        }
        fn insert_page(&self, page: &PageRow) -> Result<(), DatabaseError> {
            self.db.insert_page(page)
        }
        fn list_books(&self) -> Result<Vec<BookRow>, DatabaseError> {
            self.db.list_books()
        }
    }

    fn seed_two(root: &TempDir, db: &Database) {
        std::fs::create_dir(root.path().join("input")).unwrap();
        for name in ["first", "second"] {
            std::fs::write(
                root.path().join("input").join(format!("{name}.txt")),
                "H\na\n1\nb\n",
            )
            .unwrap();
            document_repo::insert(db, &DocumentRow::pending(name, format!("{name}.txt")))
                .unwrap();
        }
    }

    fn status(db: &Database, id: &str) -> DocumentStatus {
        document_repo::find_by_id(db, id).unwrap().unwrap().status
    }

    #[test]
    fn test_empty_cycle() {
        let root = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();

        let report = task(&root, &db).run_cycle();
        assert_eq!(report, CycleReport::default());
    }

    #[test]
    fn test_cycle_counts_outcomes() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("input")).unwrap();
        std::fs::write(root.path().join("input").join("ok.txt"), "H\na\n1\nb\n").unwrap();

        let db = Database::open_in_memory().unwrap();
        document_repo::insert(&db, &DocumentRow::pending("ok", "ok.txt")).unwrap();
        document_repo::insert(&db, &DocumentRow::pending("missing", "missing.txt")).unwrap();

        let report = task(&root, &db).run_cycle();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            document_repo::count_by_status(&db, DocumentStatus::FinishedOk).unwrap(),
            1
        );
        assert_eq!(
            document_repo::count_by_status(&db, DocumentStatus::Error).unwrap(),
            1
        );
    }

    #[test]
    fn test_finished_documents_not_picked_again() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("input")).unwrap();
        std::fs::write(root.path().join("input").join("a.txt"), "H\nx\n").unwrap();

        let db = Database::open_in_memory().unwrap();
        document_repo::insert(&db, &DocumentRow::pending("a", "a.txt")).unwrap();
        let task = task(&root, &db);

        assert_eq!(task.run_cycle().processed, 1);
        assert_eq!(task.run_cycle(), CycleReport::default());
    }

    #[test]
    fn test_listing_failure_ends_cycle() {
        let root = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        seed_two(&root, &db);
        let store = FlakyStore {
            db: db.clone(),
            fail_pending: true,
            fail_claim: None,
            taken: None,
        };

        let report = IngestTask::new(Arc::new(store), pipeline(&root)).run_cycle();

        assert_eq!(report, CycleReport::default());
        assert_eq!(status(&db, "first"), DocumentStatus::ToProcess);
        assert_eq!(status(&db, "second"), DocumentStatus::ToProcess);
    }

    #[test]
    fn test_claim_failure_skips_only_that_document() {
        let root = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        seed_two(&root, &db);
        let store = FlakyStore {
            db: db.clone(),
            fail_pending: false,
            fail_claim: Some("first"),
            taken: None,
        };

        let report = IngestTask::new(Arc::new(store), pipeline(&root)).run_cycle();

        assert_eq!(
            report,
            CycleReport {
                processed: 1,
                failed: 0,
                skipped: 1
            }
        );
        assert_eq!(status(&db, "first"), DocumentStatus::ToProcess);
        assert_eq!(status(&db, "second"), DocumentStatus::FinishedOk);
        assert!(root.path().join("input").join("first.txt").exists());
    }

    #[test]
    fn test_document_claimed_elsewhere_is_skipped() {
        let root = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        seed_two(&root, &db);
        let store = FlakyStore {
            db: db.clone(),
            fail_pending: false,
            fail_claim: None,
            taken: Some("first"),
        };

        let report = IngestTask::new(Arc::new(store), pipeline(&root)).run_cycle();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(status(&db, "first"), DocumentStatus::InProcess);
        assert!(root.path().join("input").join("first.txt").exists());
        assert!(document_repo::list_activity(&db, "first").unwrap().is_empty());
    }
}

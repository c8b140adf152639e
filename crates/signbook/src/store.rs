//! The persistence interface the ingestion pipeline talks to.
//!
//! `Database` is the production implementation; tests wrap it to inject
//! failures.

use crate::db::{
    book_repo, document_repo, page_repo, ActivityRow, BookRow, Database, DatabaseError,
    DocumentRow, DocumentStatus, PageRow,
};

pub trait DocumentStore: Send + Sync {
    /// All documents waiting to be processed, in natural store order.
    fn find_pending(&self) -> Result<Vec<DocumentRow>, DatabaseError>;

    fn find_document(&self, id: &str) -> Result<Option<DocumentRow>, DatabaseError>;

    /// Atomically moves a document from `ToProcess` to `InProcess`.
    /// Returns `false` when the document was no longer pending.
    fn claim(&self, id: &str) -> Result<bool, DatabaseError>;

    fn set_status(&self, id: &str, status: DocumentStatus) -> Result<(), DatabaseError>;

    fn set_page_break(&self, id: &str, marker: &str) -> Result<(), DatabaseError>;

    fn set_occurrences(&self, id: &str, count: u64) -> Result<(), DatabaseError>;

    fn append_activity(&self, id: &str, entry: &ActivityRow) -> Result<(), DatabaseError>;

    fn insert_page(&self, page: &PageRow) -> Result<(), DatabaseError>;

    /// The marker catalog, in natural order.
    fn list_books(&self) -> Result<Vec<BookRow>, DatabaseError>;
}

impl DocumentStore for Database {
    fn find_pending(&self) -> Result<Vec<DocumentRow>, DatabaseError> {
        document_repo::find_by_status(self, DocumentStatus::ToProcess)
    }

    fn find_document(&self, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
        document_repo::find_by_id(self, id)
    }

    fn claim(&self, id: &str) -> Result<bool, DatabaseError> {
        document_repo::transition_status(
            self,
            id,
            DocumentStatus::ToProcess,
            DocumentStatus::InProcess,
        )
    }

    fn set_status(&self, id: &str, status: DocumentStatus) -> Result<(), DatabaseError> {
        document_repo::update_status(self, id, status)
    }

    fn set_page_break(&self, id: &str, marker: &str) -> Result<(), DatabaseError> {
        document_repo::update_page_break(self, id, marker)
    }

    fn set_occurrences(&self, id: &str, count: u64) -> Result<(), DatabaseError> {
        document_repo::update_occurrences(self, id, count)
    }

    fn append_activity(&self, id: &str, entry: &ActivityRow) -> Result<(), DatabaseError> {
        document_repo::append_activity(self, id, entry)
    }

    fn insert_page(&self, page: &PageRow) -> Result<(), DatabaseError> {
        page_repo::insert(self, page)
    }

    fn list_books(&self) -> Result<Vec<BookRow>, DatabaseError> {
        book_repo::list(self)
    }
}

//! Document repository: operations on the `documents_meta` and
//! `document_activity` tables.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Processing state of a document.
///
/// Transitions only move forward: `ToProcess -> InProcess -> {FinishedOk, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    ToProcess,
    InProcess,
    FinishedOk,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToProcess => "to process",
            Self::InProcess => "in process",
            Self::FinishedOk => "finished ok",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinishedOk | Self::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to process" => Ok(Self::ToProcess),
            "in process" => Ok(Self::InProcess),
            "finished ok" => Ok(Self::FinishedOk),
            "error" => Ok(Self::Error),
            other => Err(DatabaseError::InvalidStatus(other.to_string())),
        }
    }
}

/// A raw document metadata row.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub page_break: Option<String>,
    pub occurrence_publication: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRow {
    /// Builds a fresh pending document, as the upload step would register it.
    pub fn pending(id: impl Into<String>, filename: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            filename: filename.into(),
            status: DocumentStatus::ToProcess,
            page_break: None,
            occurrence_publication: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        let status = status.parse::<DocumentStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            status,
            page_break: row.get("page_break")?,
            occurrence_publication: row.get("occurrence_publication")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// One entry of a document's append-only activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub action: String,
    pub start_time: String,
    pub end_time: String,
    /// Generated name the source file was moved under.
    pub filename: Option<String>,
    pub status: DocumentStatus,
    pub occurrences: u64,
    pub error_description: String,
}

impl ActivityRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        let status = status.parse::<DocumentStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(Self {
            action: row.get("action")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            filename: row.get("filename")?,
            status,
            occurrences: row.get("occurrences")?,
            error_description: row.get("error_description")?,
        })
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Inserts a new document row.
pub fn insert(db: &Database, doc: &DocumentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents_meta (id, filename, status, page_break,
             occurrence_publication, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                doc.id,
                doc.filename,
                doc.status.as_str(),
                doc.page_break,
                doc.occurrence_publication,
                doc.created_at,
                doc.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents_meta WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns every document in the given status, in natural store order.
pub fn find_by_status(
    db: &Database,
    status: DocumentStatus,
) -> Result<Vec<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM documents_meta WHERE status = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(params![status.as_str()], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts documents with the given status.
pub fn count_by_status(db: &Database, status: DocumentStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM documents_meta WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Moves a document from `from` to `to` only if it is still in `from`.
///
/// Returns whether the row was updated. This is the claim primitive:
/// two callers racing on the same document cannot both succeed.
pub fn transition_status(
    db: &Database,
    id: &str,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE documents_meta SET status = ?3, updated_at = ?4
             WHERE id = ?1 AND status = ?2",
            params![id, from.as_str(), to.as_str(), now()],
        )?;
        Ok(changed == 1)
    })
}

/// Unconditionally sets the status of a document.
pub fn update_status(db: &Database, id: &str, status: DocumentStatus) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents_meta SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now()],
        )?;
        Ok(())
    })
}

/// Records the page-break marker resolved for a document.
pub fn update_page_break(db: &Database, id: &str, page_break: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents_meta SET page_break = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, page_break, now()],
        )?;
        Ok(())
    })
}

/// Records how many pages were produced for a document.
pub fn update_occurrences(db: &Database, id: &str, count: u64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents_meta SET occurrence_publication = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, count, now()],
        )?;
        Ok(())
    })
}

/// Appends one entry to a document's activity log.
pub fn append_activity(
    db: &Database,
    document_id: &str,
    entry: &ActivityRow,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO document_activity (document_id, action, start_time, end_time,
             filename, status, occurrences, error_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                document_id,
                entry.action,
                entry.start_time,
                entry.end_time,
                entry.filename,
                entry.status.as_str(),
                entry.occurrences,
                entry.error_description,
            ],
        )?;
        Ok(())
    })
}

/// Lists a document's activity log in append order.
pub fn list_activity(db: &Database, document_id: &str) -> Result<Vec<ActivityRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM document_activity WHERE document_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![document_id], ActivityRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

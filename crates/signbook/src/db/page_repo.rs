//! Page repository: inserts and reads rows of the `pages` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// One stored page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRow {
    pub document_id: String,
    /// Zero-based position of the page within its document.
    pub number: u64,
    pub lines: Vec<String>,
    pub created_at: String,
}

impl PageRow {
    pub fn new(document_id: impl Into<String>, number: u64, lines: Vec<String>) -> Self {
        Self {
            document_id: document_id.into(),
            number,
            lines,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let lines: String = row.get("lines")?;
        let lines = serde_json::from_str(&lines).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            document_id: row.get("document_id")?,
            number: row.get("number")?,
            lines,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends a page. No deduplication happens here: inserting the same
/// `(document_id, number)` twice stores two rows.
pub fn insert(db: &Database, page: &PageRow) -> Result<(), DatabaseError> {
    let lines = serde_json::to_string(&page.lines)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pages (document_id, number, lines, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![page.document_id, page.number, lines, page.created_at],
        )?;
        Ok(())
    })
}

/// Lists a document's pages in insertion order.
pub fn list_for_document(db: &Database, document_id: &str) -> Result<Vec<PageRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM pages WHERE document_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![document_id], PageRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts the pages stored for a document.
pub fn count_for_document(db: &Database, document_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE document_id = ?1",
            params![document_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &PageRow::new("doc", 0, lines(&["a"]))).unwrap();
        insert(&db, &PageRow::new("doc", 1, lines(&["b", "c"]))).unwrap();
        insert(&db, &PageRow::new("other", 0, lines(&["x"]))).unwrap();

        let pages = list_for_document(&db, "doc").unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 0);
        assert_eq!(pages[1].lines, lines(&["b", "c"]));
        assert_eq!(count_for_document(&db, "doc").unwrap(), 2);
    }

    #[test]
    fn test_empty_page_round_trips() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &PageRow::new("doc", 0, Vec::new())).unwrap();

        let pages = list_for_document(&db, "doc").unwrap();
        assert!(pages[0].lines.is_empty());
    }

    #[test]
    fn test_duplicate_numbers_are_not_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let page = PageRow::new("doc", 0, lines(&["a"]));
        insert(&db, &page).unwrap();
        insert(&db, &page).unwrap();

        assert_eq!(count_for_document(&db, "doc").unwrap(), 2);
    }
}

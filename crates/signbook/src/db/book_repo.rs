//! Book catalog repository: the known page-break markers per book.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub id: String,
    pub page_break: String,
}

impl BookRow {
    pub fn new(id: impl Into<String>, page_break: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            page_break: page_break.into(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            page_break: row.get("page_break")?,
        })
    }
}

/// Registers a book and its marker.
pub fn insert(db: &Database, book: &BookRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO books (id, page_break) VALUES (?1, ?2)",
            params![book.id, book.page_break],
        )?;
        Ok(())
    })
}

/// Lists the catalog in registration order.
pub fn list(db: &Database) -> Result<Vec<BookRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id, page_break FROM books ORDER BY seq")?;
        let rows = stmt
            .query_map([], BookRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_in_registration_order() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &BookRow::new("zeta", "@@")).unwrap();
        insert(&db, &BookRow::new("alpha", "##")).unwrap();

        let books = list(&db).unwrap();
        let ids: Vec<_> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_duplicate_book_rejected() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &BookRow::new("b1", "@@")).unwrap();
        assert!(insert(&db, &BookRow::new("b1", "##")).is_err());
    }
}

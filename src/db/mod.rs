pub mod models;

use crate::analysis::fields::FieldReportEntry;
use models::{NewDocument, StoredDocument};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const CREATE_DOCUMENTS: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        content TEXT NOT NULL,
        predicted_type TEXT,
        field_report TEXT,
        improvement_report TEXT
    );
";

const SELECT_DOCUMENT: &str = "SELECT id, filename, content, predicted_type, field_report, improvement_report FROM documents";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot create database directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, DbError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    /// Existing rows are left alone; see [`Database::reset_schema`].
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.ensure_schema()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.ensure_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Idempotent: creates `documents` only if it is absent.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(CREATE_DOCUMENTS)?;
        Ok(())
    }

    /// Drop and recreate `documents`. Every stored row is lost.
    pub fn reset_schema(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS documents;")?;
        tx.execute_batch(CREATE_DOCUMENTS)?;
        tx.commit()?;
        tracing::warn!("documents table dropped and recreated");
        Ok(())
    }

    // ── Documents ──

    /// Insert one analyzed document inside its own transaction. If anything
    /// fails before commit the transaction is rolled back on drop.
    pub fn insert_document(&self, doc: &NewDocument<'_>) -> Result<i64> {
        let report = serde_json::to_string(doc.report)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO documents (filename, content, predicted_type, field_report, improvement_report) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc.filename, doc.content, doc.predicted_type, report, report],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::info!(id, filename = doc.filename, "document stored");
        Ok(id)
    }

    pub fn get_document(&self, id: i64) -> Result<Option<StoredDocument>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_DOCUMENT} WHERE id = ?1"),
                params![id],
                RawDocument::from_row,
            )
            .optional()?;
        raw.map(RawDocument::decode).transpose()
    }

    pub fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_DOCUMENT} ORDER BY id ASC"))?;
        let rows = stmt
            .query_map([], RawDocument::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(RawDocument::decode).collect()
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }
}

// Row as read from SQLite, JSON columns still encoded.
struct RawDocument {
    id: i64,
    filename: String,
    content: String,
    predicted_type: Option<String>,
    field_report: Option<String>,
    improvement_report: Option<String>,
}

impl RawDocument {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            content: row.get(2)?,
            predicted_type: row.get(3)?,
            field_report: row.get(4)?,
            improvement_report: row.get(5)?,
        })
    }

    fn decode(self) -> Result<StoredDocument> {
        Ok(StoredDocument {
            id: self.id,
            filename: self.filename,
            content: self.content,
            predicted_type: self.predicted_type,
            field_report: decode_report(self.field_report)?,
            improvement_report: decode_report(self.improvement_report)?,
        })
    }
}

fn decode_report(column: Option<String>) -> Result<Option<Vec<FieldReportEntry>>> {
    column
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FieldReportEntry {
        FieldReportEntry {
            field: "signature".into(),
            status: "MISSING".into(),
            value: String::new(),
            priority: "critical".into(),
            recommendation: "have both parties sign".into(),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = Database::in_memory().unwrap();
        let report = vec![entry()];
        let id = db
            .insert_document(&NewDocument {
                filename: "lease.pdf",
                content: "This agreement...",
                predicted_type: Some("contract"),
                report: &report,
            })
            .unwrap();

        let doc = db.get_document(id).unwrap().unwrap();
        assert_eq!(doc.filename, "lease.pdf");
        assert_eq!(doc.content, "This agreement...");
        assert_eq!(doc.predicted_type.as_deref(), Some("contract"));
        assert_eq!(doc.field_report, Some(report.clone()));
        assert_eq!(doc.field_report, doc.improvement_report);
    }

    #[test]
    fn test_ids_autoincrement() {
        let db = Database::in_memory().unwrap();
        let report = vec![entry()];
        let doc = NewDocument {
            filename: "a.pdf",
            content: "x",
            predicted_type: None,
            report: &report,
        };
        let first = db.insert_document(&doc).unwrap();
        let second = db.insert_document(&doc).unwrap();
        assert!(second > first);
        assert_eq!(db.count_documents().unwrap(), 2);
        assert_eq!(db.list_documents().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_document() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_document(42).unwrap().is_none());
    }

    #[test]
    fn test_ensure_schema_keeps_rows_reset_clears_them() {
        let db = Database::in_memory().unwrap();
        let report = vec![entry()];
        db.insert_document(&NewDocument {
            filename: "a.pdf",
            content: "x",
            predicted_type: Some("invoice"),
            report: &report,
        })
        .unwrap();

        db.ensure_schema().unwrap();
        assert_eq!(db.count_documents().unwrap(), 1);

        db.reset_schema().unwrap();
        assert_eq!(db.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_open_reports_unusable_parent_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = Database::open(&blocker.join("nested").join("documents.db"));
        assert!(matches!(result, Err(DbError::CreateDir { .. })));
    }

    #[test]
    fn test_open_creates_missing_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("documents.db");
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_documents().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_failed_insert_leaves_no_open_transaction() {
        let db = Database::in_memory().unwrap();
        {
            let conn = db.lock().unwrap();
            conn.execute_batch("DROP TABLE documents;").unwrap();
        }
        let report = vec![entry()];
        let doc = NewDocument {
            filename: "a.pdf",
            content: "x",
            predicted_type: None,
            report: &report,
        };
        assert!(matches!(db.insert_document(&doc), Err(DbError::Sqlite(_))));

        // A dangling transaction would make this BEGIN fail.
        let mut conn = db.lock().unwrap();
        assert!(conn.is_autocommit());
        conn.transaction().unwrap().commit().unwrap();
    }
}

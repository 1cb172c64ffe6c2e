// ==========================================
// Water Survey Catalog - Audit Log Repository
// ==========================================
// Immutable per-field mutation records. Insert and read
// only; nothing here updates or deletes.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sync::AuditEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AuditLogRepository Trait
// ==========================================
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Insert a batch of entries in one transaction.
    async fn insert_entries(&self, entries: &[AuditEntry]) -> RepositoryResult<usize>;

    /// Entries for one device, newest first.
    async fn entries_for_record(
        &self,
        record_id: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditEntry>>;

    /// Paged listing across all records, newest first.
    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<AuditEntry>>;

    async fn count(&self) -> RepositoryResult<usize>;
}

// ==========================================
// SqliteAuditLogRepository
// ==========================================
pub struct SqliteAuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditLogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        audit_id: row.get("audit_id")?,
        operation: row.get("operation")?,
        table_name: row.get("table_name")?,
        record_id: row.get("record_id")?,
        field: row.get("field")?,
        old_value: row.get("old_value")?,
        new_value: row.get("new_value")?,
        actor: row.get("actor")?,
        created_at: row.get::<_, DateTime<Utc>>("created_at")?,
    })
}

const SELECT_COLUMNS: &str =
    "audit_id, operation, table_name, record_id, field, old_value, new_value, actor, created_at";

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn insert_entries(&self, entries: &[AuditEntry]) -> RepositoryResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO audit_logs (
                    audit_id, operation, table_name, record_id, field,
                    old_value, new_value, actor, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;

            for entry in entries {
                stmt.execute(params![
                    entry.audit_id,
                    entry.operation,
                    entry.table_name,
                    entry.record_id,
                    entry.field,
                    entry.old_value,
                    entry.new_value,
                    entry.actor,
                    entry.created_at.to_rfc3339(),
                ])?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn entries_for_record(
        &self,
        record_id: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM audit_logs WHERE record_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            SELECT_COLUMNS
        ))?;

        let mut entries = Vec::new();
        for row in stmt.query_map(params![record_id, limit], entry_from_row)? {
            entries.push(row?);
        }
        Ok(entries)
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM audit_logs ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS
        ))?;

        let mut entries = Vec::new();
        for row in stmt.query_map(params![limit, offset], entry_from_row)? {
            entries.push(row?);
        }
        Ok(entries)
    }

    async fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

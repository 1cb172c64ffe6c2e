// ==========================================
// Water Survey Catalog - Sync History Repository
// ==========================================
// Append-only record of reconciliation runs. A row is
// inserted in `running` state and finalized exactly once;
// the pipeline never deletes history.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sync::SyncRun;
use crate::domain::types::SyncStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SyncHistoryRepository Trait
// ==========================================
#[async_trait]
pub trait SyncHistoryRepository: Send + Sync {
    /// Record the start of a run (status `running`).
    async fn insert_run(&self, run: &SyncRun) -> RepositoryResult<()>;

    /// Finalize a run. Called exactly once per run, including on
    /// failure, so no run is ever left stuck in `running`.
    async fn finalize_run(
        &self,
        run_id: &str,
        status: SyncStatus,
        devices_synced: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<()>;

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<SyncRun>>;

    /// Most recent runs first.
    async fn recent_runs(&self, limit: i64) -> RepositoryResult<Vec<SyncRun>>;
}

// ==========================================
// SqliteSyncHistoryRepository
// ==========================================
pub struct SqliteSyncHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSyncHistoryRepository {
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

fn parse_status(raw: &str) -> SyncStatus {
    match raw {
        "running" => SyncStatus::Running,
        "success" => SyncStatus::Success,
        "warning" => SyncStatus::Warning,
        _ => SyncStatus::Failed,
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<SyncRun> {
    let status: String = row.get("status")?;
    Ok(SyncRun {
        run_id: row.get("run_id")?,
        status: parse_status(&status),
        triggered_by: row.get("triggered_by")?,
        started_at: row.get::<_, DateTime<Utc>>("started_at")?,
        finished_at: row.get::<_, Option<DateTime<Utc>>>("finished_at")?,
        devices_synced: row.get::<_, i64>("devices_synced")? as usize,
        error_message: row.get("error_message")?,
    })
}

#[async_trait]
impl SyncHistoryRepository for SqliteSyncHistoryRepository {
    async fn insert_run(&self, run: &SyncRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sync_history (
                run_id, status, triggered_by, started_at,
                finished_at, devices_synced, error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                run.run_id,
                run.status.as_str(),
                run.triggered_by,
                run.started_at.to_rfc3339(),
                run.finished_at.map(|t| t.to_rfc3339()),
                run.devices_synced as i64,
                run.error_message,
            ],
        )?;
        Ok(())
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        status: SyncStatus,
        devices_synced: usize,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE sync_history
            SET status = ?2, finished_at = ?3, devices_synced = ?4, error_message = ?5
            WHERE run_id = ?1
            "#,
            params![
                run_id,
                status.as_str(),
                Utc::now().to_rfc3339(),
                devices_synced as i64,
                error_message,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "sync_history".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<SyncRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, status, triggered_by, started_at, finished_at, devices_synced, error_message \
             FROM sync_history WHERE run_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![run_id], run_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn recent_runs(&self, limit: i64) -> RepositoryResult<Vec<SyncRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, status, triggered_by, started_at, finished_at, devices_synced, error_message \
             FROM sync_history ORDER BY started_at DESC LIMIT ?1",
        )?;

        let mut runs = Vec::new();
        for row in stmt.query_map(params![limit], run_from_row)? {
            runs.push(row?);
        }
        Ok(runs)
    }
}

// ==========================================
// Water Survey Catalog - SQLite Initialization
// ==========================================
// Goals:
// - one place for Connection::open PRAGMA behavior so no
//   module ends up with foreign keys half-enabled
// - uniform busy_timeout to absorb concurrent writers
// - embedded schema bootstrap for the catalog tables
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the uniform PRAGMA set.
///
/// foreign_keys and busy_timeout are per-connection settings and
/// must be re-applied on every open.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the uniform configuration.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create the catalog tables if absent.
///
/// `survey_id` carries the store-level uniqueness constraint the
/// pipeline's upsert relies on; the log tables get auto ids plus
/// timestamps and are append-only from the pipeline's view.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survey_id TEXT NOT NULL UNIQUE,
            original_name TEXT,
            zone TEXT,
            street TEXT,
            device_type TEXT,
            status TEXT,
            lat REAL,
            lng REAL,
            houses INTEGER,
            usage_hours REAL,
            pipe_size REAL,
            motor_hp REAL,
            depth_ft REAL,
            capacity TEXT,
            tank_height_m REAL,
            tank_material TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_synced_at TEXT
        );

        CREATE TABLE IF NOT EXISTS sync_history (
            run_id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            triggered_by TEXT,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            devices_synced INTEGER NOT NULL DEFAULT 0,
            error_message TEXT
        );

        CREATE TABLE IF NOT EXISTS audit_logs (
            audit_id TEXT PRIMARY KEY,
            operation TEXT NOT NULL,
            table_name TEXT NOT NULL,
            record_id TEXT NOT NULL,
            field TEXT NOT NULL,
            old_value TEXT,
            new_value TEXT,
            actor TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_devices_zone ON devices(zone);
        CREATE INDEX IF NOT EXISTS idx_devices_device_type ON devices(device_type);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_record ON audit_logs(record_id);
        CREATE INDEX IF NOT EXISTS idx_sync_history_started ON sync_history(started_at);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_bootstrap_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('devices','sync_history','audit_logs')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_survey_id_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO devices (survey_id, created_at, updated_at) VALUES ('BW-01', '2025-01-01', '2025-01-01')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO devices (survey_id, created_at, updated_at) VALUES ('BW-01', '2025-01-01', '2025-01-01')",
            [],
        );
        assert!(dup.is_err());
    }
}

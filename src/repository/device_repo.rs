// ==========================================
// Water Survey Catalog - Device Repository
// ==========================================
// Narrow CRUD contract over the devices table. survey_id
// is the natural key; upsert is insert-or-update in place
// so replaying an unchanged source never duplicates rows.
// No business rules here, only data mapping.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::device::{DevicePayload, DeviceRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// DeviceRepository Trait
// ==========================================
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Upsert one chunk of payloads in a single transaction,
    /// keyed by survey_id. Returns the number of rows written.
    async fn upsert_batch(&self, payloads: &[DevicePayload]) -> RepositoryResult<usize>;

    /// Fetch one device by its natural key.
    async fn get_by_survey_id(&self, survey_id: &str) -> RepositoryResult<Option<DeviceRecord>>;

    /// Every persisted device keyed by survey_id, for diffing a
    /// fresh batch against the store.
    async fn all_by_survey_id(&self) -> RepositoryResult<HashMap<String, DeviceRecord>>;

    /// Paged listing, ordered by survey_id.
    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<DeviceRecord>>;

    async fn count(&self) -> RepositoryResult<usize>;
}

// ==========================================
// SqliteDeviceRepository
// ==========================================
pub struct SqliteDeviceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDeviceRepository {
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

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DeviceRecord> {
    Ok(DeviceRecord {
        payload: DevicePayload {
            survey_id: row.get("survey_id")?,
            original_name: row.get("original_name")?,
            zone: row.get("zone")?,
            street: row.get("street")?,
            device_type: row.get("device_type")?,
            status: row.get("status")?,
            lat: row.get("lat")?,
            lng: row.get("lng")?,
            houses: row.get("houses")?,
            usage_hours: row.get("usage_hours")?,
            pipe_size: row.get("pipe_size")?,
            motor_hp: row.get("motor_hp")?,
            depth_ft: row.get("depth_ft")?,
            capacity: row.get("capacity")?,
            tank_height_m: row.get("tank_height_m")?,
            tank_material: row.get("tank_material")?,
            notes: row.get("notes")?,
        },
        created_at: row.get::<_, DateTime<Utc>>("created_at")?,
        updated_at: row.get::<_, DateTime<Utc>>("updated_at")?,
        last_synced_at: row.get::<_, Option<DateTime<Utc>>>("last_synced_at")?,
    })
}

const SELECT_COLUMNS: &str = "survey_id, original_name, zone, street, device_type, status, \
     lat, lng, houses, usage_hours, pipe_size, motor_hp, depth_ft, \
     capacity, tank_height_m, tank_material, notes, \
     created_at, updated_at, last_synced_at";

#[async_trait]
impl DeviceRepository for SqliteDeviceRepository {
    async fn upsert_batch(&self, payloads: &[DevicePayload]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO devices (
                    survey_id, original_name, zone, street, device_type, status,
                    lat, lng, houses, usage_hours, pipe_size, motor_hp, depth_ft,
                    capacity, tank_height_m, tank_material, notes,
                    created_at, updated_at, last_synced_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
                )
                ON CONFLICT(survey_id) DO UPDATE SET
                    original_name = excluded.original_name,
                    zone = excluded.zone,
                    street = excluded.street,
                    device_type = excluded.device_type,
                    status = excluded.status,
                    lat = excluded.lat,
                    lng = excluded.lng,
                    houses = excluded.houses,
                    usage_hours = excluded.usage_hours,
                    pipe_size = excluded.pipe_size,
                    motor_hp = excluded.motor_hp,
                    depth_ft = excluded.depth_ft,
                    capacity = excluded.capacity,
                    tank_height_m = excluded.tank_height_m,
                    tank_material = excluded.tank_material,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at,
                    last_synced_at = excluded.last_synced_at
                "#,
            )?;

            for payload in payloads {
                stmt.execute(params![
                    payload.survey_id,
                    payload.original_name,
                    payload.zone,
                    payload.street,
                    payload.device_type,
                    payload.status,
                    payload.lat,
                    payload.lng,
                    payload.houses,
                    payload.usage_hours,
                    payload.pipe_size,
                    payload.motor_hp,
                    payload.depth_ft,
                    payload.capacity,
                    payload.tank_height_m,
                    payload.tank_material,
                    payload.notes,
                    now,
                    now,
                    now,
                ])?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn get_by_survey_id(&self, survey_id: &str) -> RepositoryResult<Option<DeviceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM devices WHERE survey_id = ?1",
            SELECT_COLUMNS
        ))?;

        let mut rows = stmt.query_map(params![survey_id], record_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn all_by_survey_id(&self) -> RepositoryResult<HashMap<String, DeviceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM devices", SELECT_COLUMNS))?;

        let mut map = HashMap::new();
        for row in stmt.query_map([], record_from_row)? {
            let record = row?;
            map.insert(record.payload.survey_id.clone(), record);
        }
        Ok(map)
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<DeviceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM devices ORDER BY survey_id LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS
        ))?;

        let mut records = Vec::new();
        for row in stmt.query_map(params![limit, offset], record_from_row)? {
            records.push(row?);
        }
        Ok(records)
    }

    async fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

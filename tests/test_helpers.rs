// ==========================================
// Test Helpers
// ==========================================
// Temp database bootstrap, workbook builders and scripted
// sheet sources shared across the integration tests.
// ==========================================

#![allow(dead_code)]

use aqua_survey::db;
use aqua_survey::importer::{CellValue, RawRow, Sheet, Workbook};
use aqua_survey::service::SheetSource;
use aqua_survey::ImportError;
use async_trait::async_trait;
use rusqlite::Connection;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Create a temp catalog database with the schema applied.
///
/// Returns the NamedTempFile (keep it alive) and the path.
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    db::configure_sqlite_connection(&conn)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// Text cell shorthand.
pub fn cell(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(value.to_string())
    }
}

/// Build a sheet from string cells; empty strings become blank cells.
pub fn make_sheet(name: &str, headers: &[&str], rows: &[&[&str]]) -> Sheet {
    Sheet {
        name: name.to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(position, cells)| RawRow {
                position,
                cells: cells.iter().map(|c| cell(c)).collect(),
            })
            .collect(),
    }
}

/// A survey workbook with the standard column layout: one
/// Borewell sheet and one Sumps sheet.
pub fn survey_workbook() -> Workbook {
    Workbook {
        sheets: vec![
            make_sheet(
                "Borewell",
                &[
                    "Survey Code (ID)",
                    "Zone",
                    "Status",
                    "Latitude",
                    "Longitude",
                    "Motor HP",
                    "Houses Connected",
                ],
                &[
                    &["BW-01", "Zone 1", "working", "17.49", "78.39", "5", "40"],
                    &["BW-02", "Zone 2", "not working", "17.50", "78.40", "3", "25"],
                ],
            ),
            make_sheet(
                "Sumps",
                &[
                    "Survey Code (ID)",
                    "Zone",
                    "Latitude",
                    "Longitude",
                    "Capacity",
                    "Tank Height (m)",
                ],
                &[&["SM-01", "Zone 1", "17.51", "78.41", "50000 Ltrs", "3.5"]],
            ),
        ],
    }
}

// ==========================================
// StaticSource - serves a fixed workbook
// ==========================================
pub struct StaticSource {
    workbook: Workbook,
}

impl StaticSource {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }
}

#[async_trait]
impl SheetSource for StaticSource {
    async fn fetch_workbook(&self) -> Result<Workbook, ImportError> {
        Ok(self.workbook.clone())
    }
}

// ==========================================
// ScriptedSource - swappable workbook + failure toggle
// ==========================================
// Lets a test change the "remote" content between fetches
// or simulate an outage.
pub struct ScriptedSource {
    workbook: Mutex<Workbook>,
    failing: AtomicBool,
}

impl ScriptedSource {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook: Mutex::new(workbook),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_workbook(&self, workbook: Workbook) {
        *self.workbook.lock().unwrap() = workbook;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SheetSource for ScriptedSource {
    async fn fetch_workbook(&self) -> Result<Workbook, ImportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ImportError::RemoteFetch(
                "connection timed out".to_string(),
            ));
        }
        Ok(self.workbook.lock().unwrap().clone())
    }
}

// ==========================================
// Water Survey Catalog - Workbook Parser
// ==========================================
// Turns a spreadsheet payload into named sheets of typed
// cells. Supports xlsx/xls payloads (calamine) and local
// CSV files (csv crate, one synthetic sheet).
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// CellValue - one raw spreadsheet cell
// ==========================================
// The only primitive shapes the source format can carry.
// Everything downstream of the parser works on these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Blank for row-skipping purposes: empty cell or
    /// whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            // Formula errors carry no usable value
            Data::Error(_) => CellValue::Empty,
        }
    }
}

// ==========================================
// RawRow - one data row with its position
// ==========================================
// `position` is the 0-based index among the sheet's data
// rows (header excluded), kept even when blank rows are
// skipped so row_index stays aligned with the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub position: usize,
    pub cells: Vec<CellValue>,
}

// ==========================================
// Sheet - one named cell grid
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// Workbook - the parsed payload
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Parse an xlsx payload fetched from the remote source.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> ImportResult<Self> {
        let cursor = Cursor::new(bytes.to_vec());
        let mut workbook: Xlsx<_> =
            Xlsx::new(cursor).map_err(|e| ImportError::Parse(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ImportError::Parse("workbook has no sheets".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::Parse(e.to_string()))?;
            sheets.push(sheet_from_rows(
                &name,
                range.rows().map(|row| row.iter().map(CellValue::from).collect()),
            ));
        }

        Ok(Self { sheets })
    }

    /// Parse a local file, dispatching on extension. A CSV file
    /// becomes a one-sheet workbook named after the file stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xls" => {
                let bytes = std::fs::read(path)?;
                Self::from_xlsx_bytes(&bytes)
            }
            "csv" => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("csv")
                    .to_string();
                Ok(Self {
                    sheets: vec![csv_sheet(path, name)?],
                })
            }
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Build a Sheet from an iterator of cell rows. The first row is
/// the header row; fully blank data rows are skipped but keep
/// their position so row numbering stays faithful to the source.
fn sheet_from_rows<I>(name: &str, mut rows: I) -> Sheet
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| match cell {
                CellValue::Text(s) => s.trim().to_string(),
                CellValue::Number(n) => n.to_string(),
                CellValue::Bool(b) => b.to_string(),
                CellValue::Empty => String::new(),
            })
            .collect(),
        None => Vec::new(),
    };

    let mut data_rows = Vec::new();
    for (position, cells) in rows.enumerate() {
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        data_rows.push(RawRow { position, cells });
    }

    Sheet {
        name: name.to_string(),
        headers,
        rows: data_rows,
    }
}

fn csv_sheet(path: &Path, name: String) -> ImportResult<Sheet> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // tolerate ragged rows
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (position, result) in reader.records().enumerate() {
        let record = result?;
        let cells: Vec<CellValue> = record
            .iter()
            .map(|value| {
                if value.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(value.to_string())
                }
            })
            .collect();

        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        rows.push(RawRow { position, cells });
    }

    Ok(Sheet {
        name,
        headers,
        rows,
    })
}

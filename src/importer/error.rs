// ==========================================
// Water Survey Catalog - Import Error Types
// ==========================================
// thiserror derive macros
// ==========================================
// Propagation policy:
// - remote/parse errors abort the whole pipeline run
// - row-scoped errors never abort the batch
// ==========================================

use thiserror::Error;

/// Import pipeline error taxonomy.
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Remote source errors =====
    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("workbook parse failed: {0}")]
    Parse(String),

    // ===== Local file errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileRead(String),

    #[error("CSV parse failed: {0}")]
    CsvParse(String),

    // ===== Row-scoped errors =====
    #[error("row {row} could not be normalized: {message}")]
    RowSanitization { row: usize, message: String },

    // ===== Generic errors =====
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileRead(err.to_string())
    }
}

impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        ImportError::RemoteFetch(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::Parse(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

/// Result alias for the import layer.
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// Water Survey Catalog - Field Sanitizers
// ==========================================
// Pure, total conversions from raw cells to typed values.
// A malformed cell becomes None, never an error: one bad
// cell must not abort the batch. Correctness reporting is
// the validator's job.
// ==========================================

use crate::domain::types::{DeviceStatus, DeviceType};
use crate::importer::workbook::CellValue;

// Strings treated as null wherever they appear, case-insensitively.
const NULL_SENTINELS: &[&str] = &["nan", "none", "null", "n/a"];

/// Raw string form of a cell, trimmed. None for empty cells and
/// null-sentinel text.
fn cell_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Empty => None,
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed.to_lowercase().as_str()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
    }
}

/// Trimmed, null-normalized string.
pub fn text(value: &CellValue) -> Option<String> {
    cell_text(value)
}

/// Finite float; no range check here (ranges are a validator concern).
pub fn coordinate(value: &CellValue) -> Option<f64> {
    let parsed = match value {
        CellValue::Number(n) => Some(*n),
        _ => cell_text(value)?.parse::<f64>().ok(),
    };
    parsed.filter(|n| n.is_finite())
}

/// Integer via float-then-truncate, so "120.0" parses. None when
/// non-finite or outside the optional bounds.
pub fn integer(value: &CellValue, min: Option<i64>, max: Option<i64>) -> Option<i64> {
    let num = match value {
        CellValue::Number(n) => Some(*n),
        _ => cell_text(value)?.parse::<f64>().ok(),
    }
    .filter(|n| n.is_finite())?;

    let num = num.trunc() as i64;
    if let Some(min) = min {
        if num < min {
            return None;
        }
    }
    if let Some(max) = max {
        if num > max {
            return None;
        }
    }
    Some(num)
}

/// Finite float within the optional bounds.
pub fn decimal(value: &CellValue, min: Option<f64>, max: Option<f64>) -> Option<f64> {
    let num = match value {
        CellValue::Number(n) => Some(*n),
        _ => cell_text(value)?.parse::<f64>().ok(),
    }
    .filter(|n| n.is_finite())?;

    if let Some(min) = min {
        if num < min {
            return None;
        }
    }
    if let Some(max) = max {
        if num > max {
            return None;
        }
    }
    Some(num)
}

/// Fold source device-type spellings onto canonical labels.
/// Unmapped text passes through trimmed so the validator can
/// report it; unmapped non-text becomes None.
pub fn device_type(value: &CellValue) -> Option<String> {
    let is_textual = matches!(value, CellValue::Text(_));
    let raw = cell_text(value)?;

    let mapped = match raw.to_lowercase().as_str() {
        "borewell" | "bore well" | "bw" => Some(DeviceType::Borewell),
        "sump" | "sm" => Some(DeviceType::Sump),
        "oht" | "ohsr" | "overhead tank" | "overhead" => Some(DeviceType::Ohsr),
        _ => None,
    };

    match mapped {
        Some(dt) => Some(dt.label().to_string()),
        None if is_textual => Some(raw),
        None => None,
    }
}

/// Same synonym-table pattern for the status enumeration.
pub fn status(value: &CellValue) -> Option<String> {
    let is_textual = matches!(value, CellValue::Text(_));
    let raw = cell_text(value)?;

    let mapped = match raw.to_lowercase().as_str() {
        "working" | "work" => Some(DeviceStatus::Working),
        "not working" | "not work" | "notworking" => Some(DeviceStatus::NotWorking),
        "on repair" | "repair" => Some(DeviceStatus::OnRepair),
        "failed" | "fail" => Some(DeviceStatus::Failed),
        _ => None,
    };

    match mapped {
        Some(st) => Some(st.label().to_string()),
        None if is_textual => Some(raw),
        None => None,
    }
}

// ==========================================
// Water Survey Catalog - Row Normalizer
// ==========================================
// RawRow -> CanonicalDevice. Device type follows one
// deterministic precedence: sheet-level override, then
// the sanitized column value, then the default type.
// Type-specific attributes are populated whenever the
// column carries a value, regardless of inferred type,
// so the record shape stays uniform.
// ==========================================

use crate::domain::device::CanonicalDevice;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_resolver::{self, CanonicalField, HeaderReport};
use crate::importer::sanitizer;
use crate::importer::workbook::{CellValue, RawRow, Sheet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Offset turning a 0-based data-row position into the row number
/// a human sees in the spreadsheet (1-based, header row counted).
pub const HEADER_ROW_OFFSET: usize = 2;

// ==========================================
// NormalizerOptions
// ==========================================
#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Sheet-level device type authority. Set when the sheet is
    /// known to be single-type; wins over the column value.
    pub device_type_override: Option<String>,
    /// Applied when neither override nor column yields a type.
    pub default_device_type: String,
    pub header_row_offset: usize,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            device_type_override: None,
            default_device_type: "Borewell".to_string(),
            header_row_offset: HEADER_ROW_OFFSET,
        }
    }
}

impl NormalizerOptions {
    pub fn with_override(device_type: &str) -> Self {
        Self {
            device_type_override: Some(device_type.to_string()),
            ..Self::default()
        }
    }
}

// ==========================================
// NormalizedSheet - one sheet's output
// ==========================================
#[derive(Debug, Clone)]
pub struct NormalizedSheet {
    pub sheet_name: String,
    pub devices: Vec<CanonicalDevice>,
    /// Rows that failed normalization outright. Counted separately
    /// from validation failures; they never abort the batch.
    pub skipped: Vec<SkippedRow>,
    pub header_report: HeaderReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub message: String,
}

/// Normalize every data row of one sheet.
pub fn normalize_sheet(sheet: &Sheet, options: &NormalizerOptions) -> NormalizedSheet {
    let resolved = header_resolver::resolve_headers(&sheet.headers);

    let mut devices = Vec::with_capacity(sheet.rows.len());
    let mut skipped = Vec::new();

    for row in &sheet.rows {
        let row_index = row.position + options.header_row_offset;
        match normalize_row(&resolved.columns, row, row_index, options) {
            Ok(device) => devices.push(device),
            Err(e) => {
                warn!(sheet = %sheet.name, row_index, error = %e, "row skipped during normalization");
                skipped.push(SkippedRow {
                    row_index,
                    message: e.to_string(),
                });
            }
        }
    }

    NormalizedSheet {
        sheet_name: sheet.name.clone(),
        devices,
        skipped,
        header_report: resolved.report,
    }
}

/// Normalize one raw row.
///
/// Sanitizers are total, so the only failure mode is a row whose
/// cell grid does not line up with the header row (ragged CSV
/// input carrying data outside any labeled column).
pub fn normalize_row(
    columns: &[Option<CanonicalField>],
    row: &RawRow,
    row_index: usize,
    options: &NormalizerOptions,
) -> ImportResult<CanonicalDevice> {
    if row.cells.len() > columns.len()
        && row.cells[columns.len()..].iter().any(|c| !c.is_blank())
    {
        return Err(ImportError::RowSanitization {
            row: row_index,
            message: format!(
                "row has {} cells but the sheet has {} headers",
                row.cells.len(),
                columns.len()
            ),
        });
    }

    // First column mapping onto a field wins; later duplicates are
    // inaccessible, same as an unresolved header.
    let mut cells: HashMap<CanonicalField, &CellValue> = HashMap::new();
    for (idx, field) in columns.iter().enumerate() {
        if let (Some(field), Some(cell)) = (field, row.cells.get(idx)) {
            cells.entry(*field).or_insert(cell);
        }
    }

    let cell = |field: CanonicalField| -> &CellValue {
        cells.get(&field).copied().unwrap_or(&CellValue::Empty)
    };

    let device_type = options
        .device_type_override
        .clone()
        .or_else(|| sanitizer::device_type(cell(CanonicalField::DeviceType)))
        .or_else(|| Some(options.default_device_type.clone()));

    Ok(CanonicalDevice {
        survey_id: sanitizer::text(cell(CanonicalField::SurveyId)),
        original_name: sanitizer::text(cell(CanonicalField::OriginalName)),
        zone: sanitizer::text(cell(CanonicalField::Zone)),
        street: sanitizer::text(cell(CanonicalField::Street)),
        device_type,
        status: sanitizer::status(cell(CanonicalField::Status)),
        lat: sanitizer::coordinate(cell(CanonicalField::Lat)),
        lng: sanitizer::coordinate(cell(CanonicalField::Lng)),
        houses: sanitizer::integer(cell(CanonicalField::Houses), Some(0), Some(10000)),
        usage_hours: sanitizer::decimal(cell(CanonicalField::UsageHours), Some(0.0), Some(24.0)),
        pipe_size: sanitizer::decimal(cell(CanonicalField::PipeSize), Some(0.0), Some(100.0)),
        motor_hp: sanitizer::decimal(cell(CanonicalField::MotorHp), Some(0.0), Some(1000.0)),
        depth_ft: sanitizer::decimal(cell(CanonicalField::DepthFt), Some(0.0), None),
        capacity: sanitizer::text(cell(CanonicalField::Capacity)),
        tank_height_m: sanitizer::decimal(cell(CanonicalField::TankHeightM), Some(0.0), None),
        tank_material: sanitizer::text(cell(CanonicalField::TankMaterial)),
        notes: sanitizer::text(cell(CanonicalField::Notes)),
        row_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn survey_sheet(rows: Vec<Vec<CellValue>>) -> Sheet {
        Sheet {
            name: "All".to_string(),
            headers: vec![
                "Survey Code (ID)".to_string(),
                "Latitude".to_string(),
                "Longitude".to_string(),
                "Status".to_string(),
            ],
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(position, cells)| RawRow { position, cells })
                .collect(),
        }
    }

    #[test]
    fn test_basic_row() {
        let sheet = survey_sheet(vec![vec![
            t("BW-01"),
            t("17.49"),
            t("78.39"),
            t("working"),
        ]]);
        let out = normalize_sheet(&sheet, &NormalizerOptions::default());

        assert_eq!(out.devices.len(), 1);
        assert!(out.skipped.is_empty());
        let device = &out.devices[0];
        assert_eq!(device.survey_id.as_deref(), Some("BW-01"));
        assert_eq!(device.lat, Some(17.49));
        assert_eq!(device.lng, Some(78.39));
        assert_eq!(device.status.as_deref(), Some("Working"));
        // no override, no column: default applies
        assert_eq!(device.device_type.as_deref(), Some("Borewell"));
        assert_eq!(device.row_index, 2);
    }

    #[test]
    fn test_row_index_accounts_for_header_row() {
        let sheet = survey_sheet(vec![
            vec![t("BW-01"), t("17.49"), t("78.39"), CellValue::Empty],
            vec![t("BW-02"), t("17.50"), t("78.40"), CellValue::Empty],
        ]);
        let out = normalize_sheet(&sheet, &NormalizerOptions::default());

        assert_eq!(out.devices[0].row_index, 2);
        assert_eq!(out.devices[1].row_index, 3);
    }

    #[test]
    fn test_type_precedence_override_beats_column() {
        let sheet = Sheet {
            name: "Sumps".to_string(),
            headers: vec!["Survey Code (ID)".to_string(), "Device Type".to_string()],
            rows: vec![RawRow {
                position: 0,
                cells: vec![t("SM-01"), t("borewell")],
            }],
        };

        let out = normalize_sheet(&sheet, &NormalizerOptions::with_override("Sump"));
        assert_eq!(out.devices[0].device_type.as_deref(), Some("Sump"));

        let out = normalize_sheet(&sheet, &NormalizerOptions::default());
        assert_eq!(out.devices[0].device_type.as_deref(), Some("Borewell"));
    }

    #[test]
    fn test_tank_attributes_survive_normalization() {
        let sheet = Sheet {
            name: "OHTs".to_string(),
            headers: vec![
                "Survey Code (ID)".to_string(),
                "Capacity".to_string(),
                "Tank Height (m)".to_string(),
                "Material".to_string(),
            ],
            rows: vec![RawRow {
                position: 0,
                cells: vec![t("OT-01"), t("50000 Ltrs"), t("12.5"), t("RCC")],
            }],
        };

        let out = normalize_sheet(&sheet, &NormalizerOptions::with_override("OHSR"));
        let device = &out.devices[0];
        assert_eq!(device.capacity.as_deref(), Some("50000 Ltrs"));
        assert_eq!(device.tank_height_m, Some(12.5));
        assert_eq!(device.tank_material.as_deref(), Some("RCC"));
        // well fields stay null rather than being omitted
        assert_eq!(device.motor_hp, None);
        assert_eq!(device.houses, None);
    }

    #[test]
    fn test_normalizer_is_idempotent() {
        let sheet = survey_sheet(vec![vec![
            t(" BW-07 "),
            t("17.49281"),
            t("78.39210"),
            t("not working"),
        ]]);
        let options = NormalizerOptions::default();

        let first = normalize_sheet(&sheet, &options);
        let second = normalize_sheet(&sheet, &options);
        assert_eq!(first.devices, second.devices);
    }

    #[test]
    fn test_ragged_row_skipped_not_fatal() {
        let mut sheet = survey_sheet(vec![vec![
            t("BW-01"),
            t("17.49"),
            t("78.39"),
            CellValue::Empty,
        ]]);
        // data outside any labeled column
        sheet.rows.push(RawRow {
            position: 1,
            cells: vec![
                t("BW-02"),
                t("17.50"),
                t("78.40"),
                CellValue::Empty,
                t("stray"),
            ],
        });

        let out = normalize_sheet(&sheet, &NormalizerOptions::default());
        assert_eq!(out.devices.len(), 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].row_index, 3);
    }

    #[test]
    fn test_unresolved_headers_dropped_and_reported() {
        let sheet = Sheet {
            name: "Borewell".to_string(),
            headers: vec!["Survey Code (ID)".to_string(), "Images".to_string()],
            rows: vec![RawRow {
                position: 0,
                cells: vec![t("BW-01"), t("img.jpg")],
            }],
        };

        let out = normalize_sheet(&sheet, &NormalizerOptions::default());
        assert_eq!(out.header_report.unresolved, vec!["Images".to_string()]);
        // synthesized-null fields keep the schema complete
        assert_eq!(out.devices[0].lat, None);
        assert_eq!(out.devices[0].notes, None);
    }
}

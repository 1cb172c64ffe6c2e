// ==========================================
// Water Survey Catalog - Header Resolver
// ==========================================
// Source column titles drift across sheet revisions
// without notice, so resolution is exact-first with
// keyword fallbacks for the load-bearing fields.
// Unresolved headers are dropped (reported, not an
// error); canonical fields absent from a sheet are
// synthesized as null downstream.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CanonicalField - the fixed target schema
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    SurveyId,
    OriginalName,
    Zone,
    Street,
    DeviceType,
    Status,
    Lat,
    Lng,
    Houses,
    UsageHours,
    PipeSize,
    MotorHp,
    DepthFt,
    Capacity,
    TankHeightM,
    TankMaterial,
    Notes,
}

impl CanonicalField {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::SurveyId => "survey_id",
            CanonicalField::OriginalName => "original_name",
            CanonicalField::Zone => "zone",
            CanonicalField::Street => "street",
            CanonicalField::DeviceType => "device_type",
            CanonicalField::Status => "status",
            CanonicalField::Lat => "lat",
            CanonicalField::Lng => "lng",
            CanonicalField::Houses => "houses",
            CanonicalField::UsageHours => "usage_hours",
            CanonicalField::PipeSize => "pipe_size",
            CanonicalField::MotorHp => "motor_hp",
            CanonicalField::DepthFt => "depth_ft",
            CanonicalField::Capacity => "capacity",
            CanonicalField::TankHeightM => "tank_height_m",
            CanonicalField::TankMaterial => "tank_material",
            CanonicalField::Notes => "notes",
        }
    }

    pub fn all() -> &'static [CanonicalField] {
        &[
            CanonicalField::SurveyId,
            CanonicalField::OriginalName,
            CanonicalField::Zone,
            CanonicalField::Street,
            CanonicalField::DeviceType,
            CanonicalField::Status,
            CanonicalField::Lat,
            CanonicalField::Lng,
            CanonicalField::Houses,
            CanonicalField::UsageHours,
            CanonicalField::PipeSize,
            CanonicalField::MotorHp,
            CanonicalField::DepthFt,
            CanonicalField::Capacity,
            CanonicalField::TankHeightM,
            CanonicalField::TankMaterial,
            CanonicalField::Notes,
        ]
    }
}

// Known header spellings, compared case-insensitively on the
// trimmed title. Covers the survey sheets plus the per-type
// sheet variants.
const HEADER_DICTIONARY: &[(&str, CanonicalField)] = &[
    ("survey code (id)", CanonicalField::SurveyId),
    ("survey code", CanonicalField::SurveyId),
    ("original name", CanonicalField::OriginalName),
    ("zone", CanonicalField::Zone),
    ("street name / landmark", CanonicalField::Street),
    ("location", CanonicalField::Street),
    ("device type", CanonicalField::DeviceType),
    ("status", CanonicalField::Status),
    ("latitude", CanonicalField::Lat),
    ("longitude", CanonicalField::Lng),
    ("houses conn.", CanonicalField::Houses),
    ("houses connected", CanonicalField::Houses),
    ("daily usage (hrs)", CanonicalField::UsageHours),
    ("pipe size (inch)", CanonicalField::PipeSize),
    ("motor hp / cap", CanonicalField::MotorHp),
    ("motor hp", CanonicalField::MotorHp),
    ("depth (ft)", CanonicalField::DepthFt),
    ("capacity", CanonicalField::Capacity),
    ("tank height (m)", CanonicalField::TankHeightM),
    ("tank material", CanonicalField::TankMaterial),
    ("material", CanonicalField::TankMaterial),
    ("notes / maintenance issue", CanonicalField::Notes),
    ("notes", CanonicalField::Notes),
];

/// Resolve a single header title to a canonical field.
///
/// Exact case-insensitive match first; then keyword heuristics
/// for the critical fields only. GPS columns are the one truly
/// load-bearing pair, so "lat"/"long" substrings are accepted.
pub fn resolve_header(header: &str) -> Option<CanonicalField> {
    let normalized = header.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    for (known, field) in HEADER_DICTIONARY {
        if normalized == *known {
            return Some(*field);
        }
    }

    // Keyword fallbacks, ordered: survey id before coordinates so
    // a title like "survey code / location" cannot shadow GPS.
    if normalized.contains("survey") && normalized.contains("code") {
        return Some(CanonicalField::SurveyId);
    }
    if normalized.contains("lat") {
        return Some(CanonicalField::Lat);
    }
    if normalized.contains("long") {
        return Some(CanonicalField::Lng);
    }

    None
}

// ==========================================
// ResolvedHeaders - per-sheet column mapping
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeaders {
    /// Canonical field per source column, in column order.
    /// None means the column's data is inaccessible to the pipeline.
    pub columns: Vec<Option<CanonicalField>>,
    pub report: HeaderReport,
}

/// Resolution summary surfaced in snapshot metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderReport {
    pub resolved_count: usize,
    pub unresolved: Vec<String>,
    /// Canonical fields no column mapped onto; downstream sees null.
    pub missing_fields: Vec<String>,
}

/// Resolve every header of one sheet.
pub fn resolve_headers(headers: &[String]) -> ResolvedHeaders {
    let columns: Vec<Option<CanonicalField>> =
        headers.iter().map(|h| resolve_header(h)).collect();

    let unresolved: Vec<String> = headers
        .iter()
        .zip(&columns)
        .filter(|(header, field)| field.is_none() && !header.trim().is_empty())
        .map(|(header, _)| header.clone())
        .collect();

    let missing_fields: Vec<String> = CanonicalField::all()
        .iter()
        .filter(|field| !columns.contains(&Some(**field)))
        .map(|field| field.name().to_string())
        .collect();

    let resolved_count = columns.iter().filter(|c| c.is_some()).count();

    ResolvedHeaders {
        columns,
        report: HeaderReport {
            resolved_count,
            unresolved,
            missing_fields,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_case_insensitive() {
        assert_eq!(resolve_header("Latitude"), Some(CanonicalField::Lat));
        assert_eq!(resolve_header("LATITUDE"), Some(CanonicalField::Lat));
        assert_eq!(resolve_header("latitude"), Some(CanonicalField::Lat));
        assert_eq!(
            resolve_header("Survey Code (ID)"),
            Some(CanonicalField::SurveyId)
        );
        assert_eq!(
            resolve_header("Street Name / Landmark"),
            Some(CanonicalField::Street)
        );
    }

    #[test]
    fn test_fuzzy_survey_code_with_extra_spaces() {
        // drifted spelling: doubled space, no space before parenthesis
        assert_eq!(
            resolve_header("Survey  Code(ID) "),
            Some(CanonicalField::SurveyId)
        );
    }

    #[test]
    fn test_fuzzy_gps_keywords() {
        assert_eq!(resolve_header("Lat."), Some(CanonicalField::Lat));
        assert_eq!(resolve_header("GPS Long"), Some(CanonicalField::Lng));
    }

    #[test]
    fn test_unknown_header_dropped() {
        assert_eq!(resolve_header("Images"), None);
        assert_eq!(resolve_header("Done"), None);
        assert_eq!(resolve_header(""), None);
    }

    #[test]
    fn test_tank_and_well_sheet_variants() {
        assert_eq!(resolve_header("Depth (ft)"), Some(CanonicalField::DepthFt));
        assert_eq!(resolve_header("Capacity"), Some(CanonicalField::Capacity));
        assert_eq!(
            resolve_header("Tank Height (m)"),
            Some(CanonicalField::TankHeightM)
        );
        assert_eq!(resolve_header("Motor HP"), Some(CanonicalField::MotorHp));
        assert_eq!(
            resolve_header("Houses Connected"),
            Some(CanonicalField::Houses)
        );
    }

    #[test]
    fn test_resolve_headers_report() {
        let headers = vec![
            "Survey Code (ID)".to_string(),
            "Latitude".to_string(),
            "Longitude".to_string(),
            "Images".to_string(),
        ];
        let resolved = resolve_headers(&headers);

        assert_eq!(resolved.columns[0], Some(CanonicalField::SurveyId));
        assert_eq!(resolved.report.resolved_count, 3);
        assert_eq!(resolved.report.unresolved, vec!["Images".to_string()]);
        assert!(resolved
            .report
            .missing_fields
            .contains(&"device_type".to_string()));
        assert!(!resolved.report.missing_fields.contains(&"lat".to_string()));
    }
}

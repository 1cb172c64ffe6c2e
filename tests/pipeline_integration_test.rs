// ==========================================
// Pipeline Integration Tests
// ==========================================
// Workbook -> normalize -> validate, end to end through
// the survey service.
// ==========================================

mod test_helpers;

use aqua_survey::logging;
use aqua_survey::service::{SurveyService, ALL_SHEET_KEY};
use aqua_survey::ErrorCategory;
use aqua_survey::ImportError;
use std::time::Duration;
use test_helpers::{make_sheet, survey_workbook, StaticSource};

fn service(workbook: aqua_survey::Workbook) -> SurveyService<StaticSource> {
    SurveyService::new(StaticSource::new(workbook), Duration::from_secs(3600))
}

#[tokio::test]
async fn test_single_sheet_end_to_end() {
    logging::init_test();
    let survey = service(survey_workbook());

    let snapshot = survey.get_survey_data("Borewell").await.unwrap();

    assert_eq!(snapshot.stats.total, 2);
    assert_eq!(snapshot.stats.valid, 2);
    assert_eq!(snapshot.stats.validation_rate, 100.0);

    let device = &snapshot.devices[0];
    assert_eq!(device.survey_id.as_deref(), Some("BW-01"));
    assert_eq!(device.status.as_deref(), Some("Working"));
    assert_eq!(device.lat, Some(17.49));
    assert_eq!(device.lng, Some(78.39));
    assert_eq!(device.motor_hp, Some(5.0));
    assert_eq!(device.houses, Some(40));
    assert_eq!(device.row_index, 2);

    let metadata = &snapshot.metadata;
    assert_eq!(metadata.sheet_name, "Borewell");
    assert_eq!(metadata.skipped_rows, 0);
    assert!(metadata.header_report.is_some());
}

#[tokio::test]
async fn test_all_pseudo_sheet_aggregates_and_overrides_type() {
    logging::init_test();
    let survey = service(survey_workbook());

    let snapshot = survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();

    assert_eq!(snapshot.stats.total, 3);
    assert_eq!(
        snapshot.metadata.source_sheets,
        vec!["Borewell".to_string(), "Sumps".to_string()]
    );

    // sheet name is authoritative for the type
    let sump = snapshot
        .devices
        .iter()
        .find(|d| d.survey_id.as_deref() == Some("SM-01"))
        .unwrap();
    assert_eq!(sump.device_type.as_deref(), Some("Sump"));
    assert_eq!(sump.capacity.as_deref(), Some("50000 Ltrs"));
    assert_eq!(sump.tank_height_m, Some(3.5));

    let borewell = snapshot
        .devices
        .iter()
        .find(|d| d.survey_id.as_deref() == Some("BW-01"))
        .unwrap();
    assert_eq!(borewell.device_type.as_deref(), Some("Borewell"));
}

#[tokio::test]
async fn test_all_skips_non_device_sheets() {
    let workbook = aqua_survey::Workbook {
        sheets: vec![
            make_sheet(
                "Summary",
                &["Zone", "Count"],
                &[&["Zone 1", "12"]],
            ),
            make_sheet(
                "Borewell",
                &["Survey Code (ID)", "Latitude", "Longitude"],
                &[&["BW-01", "17.49", "78.39"]],
            ),
        ],
    };
    let survey = service(workbook);

    let snapshot = survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    assert_eq!(snapshot.stats.total, 1);
    assert_eq!(snapshot.metadata.source_sheets, vec!["Borewell".to_string()]);
}

#[tokio::test]
async fn test_invalid_rows_are_quarantined_with_errors() {
    let workbook = aqua_survey::Workbook {
        sheets: vec![make_sheet(
            "Borewell",
            &["Survey Code (ID)", "Latitude", "Longitude"],
            &[
                &["BW-01", "17.49", "78.39"],
                &["", "95.0", "78.39"],
                &["BW-03", "not-a-number", "78.39"],
            ],
        )],
    };
    let survey = service(workbook);

    let snapshot = survey.get_survey_data("Borewell").await.unwrap();

    assert_eq!(snapshot.stats.total, 3);
    assert_eq!(snapshot.stats.valid, 1);
    assert_eq!(snapshot.stats.invalid, 2);
    assert_eq!(snapshot.stats.validation_rate, 33.33);

    let quarantined = &snapshot.invalid_devices[0];
    assert_eq!(
        quarantined.validation_errors,
        vec![
            "Missing required field: survey_id".to_string(),
            "Latitude out of range: 95.0 (must be -90 to 90)".to_string(),
        ]
    );

    // unparseable latitude sanitizes to null -> missing_coordinates
    let breakdown = &snapshot.stats.error_breakdown;
    assert!(breakdown.contains_key(&ErrorCategory::MissingRequiredField));
    assert!(breakdown.contains_key(&ErrorCategory::CoordinateOutOfRange));
    assert!(breakdown.contains_key(&ErrorCategory::MissingCoordinates));
}

#[tokio::test]
async fn test_header_drift_still_finds_gps_columns() {
    let workbook = aqua_survey::Workbook {
        sheets: vec![make_sheet(
            "Borewell",
            // drifted titles: fuzzy matching has to carry all three
            &["Survey  Code(ID) ", "Lat.", "GPS Long"],
            &[&["BW-01", "17.49", "78.39"]],
        )],
    };
    let survey = service(workbook);

    let snapshot = survey.get_survey_data("Borewell").await.unwrap();
    assert_eq!(snapshot.stats.valid, 1);
    let device = &snapshot.devices[0];
    assert_eq!(device.survey_id.as_deref(), Some("BW-01"));
    assert_eq!(device.lat, Some(17.49));
    assert_eq!(device.lng, Some(78.39));
}

#[tokio::test]
async fn test_missing_sheet_lists_available() {
    let survey = service(survey_workbook());

    let err = survey.get_survey_data("OHTs").await.unwrap_err();
    match err {
        ImportError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "OHTs");
            assert_eq!(available, vec!["Borewell".to_string(), "Sumps".to_string()]);
        }
        other => panic!("expected SheetNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_normalizer_output_is_stable_across_runs() {
    let survey_a = service(survey_workbook());
    let survey_b = service(survey_workbook());

    let first = survey_a.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    let second = survey_b.get_survey_data(ALL_SHEET_KEY).await.unwrap();

    assert_eq!(first.devices, second.devices);
    assert_eq!(first.stats, second.stats);
}

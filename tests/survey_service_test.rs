// ==========================================
// Survey Service Tests
// ==========================================
// Cache and fetch orchestration: TTL behavior, manual
// refresh, single-flight collapse and outage handling.
// ==========================================

mod test_helpers;

use aqua_survey::service::{SurveyService, ALL_SHEET_KEY};
use aqua_survey::ImportError;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{survey_workbook, ScriptedSource, StaticSource};

#[tokio::test]
async fn test_warm_cache_avoids_refetch() {
    let survey = SurveyService::new(
        StaticSource::new(survey_workbook()),
        Duration::from_secs(3600),
    );

    survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();

    assert_eq!(survey.total_fetches(), 1);
}

#[tokio::test]
async fn test_sheets_are_cached_independently() {
    let survey = SurveyService::new(
        StaticSource::new(survey_workbook()),
        Duration::from_secs(3600),
    );

    survey.get_survey_data("Borewell").await.unwrap();
    survey.get_survey_data("Sumps").await.unwrap();
    survey.get_survey_data("Borewell").await.unwrap();

    assert_eq!(survey.total_fetches(), 2);
    assert_eq!(survey.cached_snapshot_count().await, 2);
}

#[tokio::test]
async fn test_concurrent_misses_collapse_to_one_fetch() {
    let survey = Arc::new(SurveyService::new(
        StaticSource::new(survey_workbook()),
        Duration::from_secs(3600),
    ));

    // a stampede of cold-cache readers for the same key
    let results = futures::future::join_all(
        (0..8).map(|_| survey.get_survey_data(ALL_SHEET_KEY)),
    )
    .await;
    for result in results {
        result.unwrap();
    }

    assert_eq!(survey.total_fetches(), 1);
}

#[tokio::test]
async fn test_manual_refresh_invalidates() {
    let survey = SurveyService::new(
        StaticSource::new(survey_workbook()),
        Duration::from_secs(3600),
    );

    survey.get_survey_data("Borewell").await.unwrap();
    survey.get_survey_data("Sumps").await.unwrap();

    survey.refresh(Some("Borewell")).await;
    survey.get_survey_data("Borewell").await.unwrap();
    assert_eq!(survey.total_fetches(), 3);

    // "Sumps" was untouched by the single-key refresh
    survey.get_survey_data("Sumps").await.unwrap();
    assert_eq!(survey.total_fetches(), 3);

    survey.refresh(None).await;
    assert_eq!(survey.cached_snapshot_count().await, 0);
}

#[tokio::test]
async fn test_fetch_failure_surfaces_and_leaves_cache_untouched() {
    let source = Arc::new(ScriptedSource::new(survey_workbook()));
    // zero TTL: every entry is stale immediately
    let survey = SurveyService::new(source.clone(), Duration::ZERO);

    survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    assert_eq!(survey.cached_snapshot_count().await, 1);

    source.set_failing(true);
    let err = survey.get_survey_data(ALL_SHEET_KEY).await.unwrap_err();
    assert!(matches!(err, ImportError::RemoteFetch(_)));

    // the stale entry is still present, not evicted by the failure
    assert_eq!(survey.cached_snapshot_count().await, 1);
}

#[tokio::test]
async fn test_recovery_after_outage() {
    let source = Arc::new(ScriptedSource::new(survey_workbook()));
    let survey = SurveyService::new(source.clone(), Duration::from_secs(3600));

    source.set_failing(true);
    assert!(survey.get_survey_data(ALL_SHEET_KEY).await.is_err());

    source.set_failing(false);
    let snapshot = survey.get_survey_data(ALL_SHEET_KEY).await.unwrap();
    assert_eq!(snapshot.stats.total, 3);
}

#[tokio::test]
async fn test_available_sheets_from_inventory() {
    let survey = SurveyService::new(
        StaticSource::new(survey_workbook()),
        Duration::from_secs(3600),
    );

    let sheets = survey.available_sheets().await.unwrap();
    assert_eq!(sheets, vec!["Borewell".to_string(), "Sumps".to_string()]);

    // inventory is remembered from the first fetch
    survey.available_sheets().await.unwrap();
    assert_eq!(survey.total_fetches(), 1);
}

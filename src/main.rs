// ==========================================
// Water Survey Catalog - Sync Entrypoint
// ==========================================
// Fetches the survey workbook, runs the full pipeline and
// reconciles the result into the SQLite catalog. One sync
// pass per invocation; scheduling lives outside.
// ==========================================

use aqua_survey::config::AppConfig;
use aqua_survey::db;
use aqua_survey::repository::{
    SqliteAuditLogRepository, SqliteDeviceRepository, SqliteSyncHistoryRepository,
};
use aqua_survey::service::{RemoteWorkbookSource, SurveyService, SyncEngine};
use aqua_survey::{logging, APP_NAME, VERSION};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env();
    if config.source_url.is_empty() {
        anyhow::bail!("AQUA_SURVEY_SOURCE_URL is not set");
    }
    tracing::info!(db_path = %config.db_path, source_url = %config.source_url, "configuration loaded");

    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_sqlite_connection(&config.db_path)?;
    db::init_schema(&conn)?;
    drop(conn);

    let source = RemoteWorkbookSource::new(&config.source_url, config.fetch_timeout())?;
    let survey = Arc::new(SurveyService::new(source, config.cache_ttl()));

    let devices = Arc::new(SqliteDeviceRepository::new(&config.db_path)?);
    let history = Arc::new(SqliteSyncHistoryRepository::new(&config.db_path)?);
    let audit = Arc::new(SqliteAuditLogRepository::new(&config.db_path)?);

    let engine = SyncEngine::new(survey, devices, history, audit)
        .with_chunk_size(config.upsert_chunk_size);

    let outcome = engine.run(None).await?;
    tracing::info!(
        run_id = %outcome.run_id,
        status = %outcome.status,
        processed = outcome.devices_processed,
        upserted = outcome.devices_upserted,
        audited = outcome.audited_changes,
        "sync pass complete"
    );

    Ok(())
}

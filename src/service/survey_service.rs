// ==========================================
// Water Survey Catalog - Survey Service
// ==========================================
// Fetch/cache orchestrator. Retrieves the remote workbook,
// discovers sheets, runs normalization + validation, and
// memoizes the result per sheet key behind a TTL cache.
// Nothing partial is ever cached: a fetch or parse failure
// aborts the invocation and leaves the cache untouched.
// ==========================================

use crate::domain::device::{CanonicalDevice, InvalidDevice, ValidationStats};
use crate::domain::types::DeviceType;
use crate::importer::batch_validator::validate_batch;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_resolver::HeaderReport;
use crate::importer::row_normalizer::{normalize_sheet, NormalizerOptions};
use crate::importer::workbook::Workbook;
use crate::service::cache::SheetCache;
use crate::service::source::SheetSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Pseudo-sheet aggregating every device sheet in the workbook.
pub const ALL_SHEET_KEY: &str = "All";

// Sheet names carrying one of these fragments are device sheets;
// the sheet name is then authoritative for the device type.
const DEVICE_SHEET_KEYWORDS: &[&str] = &["bore", "sump", "ohsr", "oht", "overhead"];

/// Infer the device type a sheet holds from its name.
///
/// None when the name matches no device keyword (summary or
/// scratch sheets travel in the same workbook).
pub fn infer_sheet_device_type(sheet_name: &str) -> Option<DeviceType> {
    let lower = sheet_name.to_lowercase();
    if !DEVICE_SHEET_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }
    if lower.contains("sump") {
        Some(DeviceType::Sump)
    } else if lower.contains("ohsr") || lower.contains("oht") || lower.contains("overhead") {
        Some(DeviceType::Ohsr)
    } else {
        Some(DeviceType::Borewell)
    }
}

// ==========================================
// SheetSnapshot - one cached pipeline output
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub devices: Vec<CanonicalDevice>,
    pub invalid_devices: Vec<InvalidDevice>,
    pub stats: ValidationStats,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub sheet_name: String,
    /// Physical sheets the snapshot was built from; more than one
    /// for the "All" pseudo-sheet.
    pub source_sheets: Vec<String>,
    /// Header resolution report; absent for aggregated snapshots.
    pub header_report: Option<HeaderReport>,
    /// Rows skipped during normalization, distinct from rows
    /// quarantined by validation.
    pub skipped_rows: usize,
    pub fetched_at: DateTime<Utc>,
}

// ==========================================
// SurveyService
// ==========================================
pub struct SurveyService<S: SheetSource> {
    source: S,
    cache: SheetCache,
    // Sheet inventory from the last successful fetch.
    known_sheets: RwLock<Option<Vec<String>>>,
    fetch_count: AtomicU64,
}

impl<S: SheetSource> SurveyService<S> {
    pub fn new(source: S, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache: SheetCache::new(cache_ttl),
            known_sheets: RwLock::new(None),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Normalized, validated survey data for one sheet key.
    ///
    /// Served from cache when warm; otherwise fetches, runs the
    /// full pipeline, and fills the cache. Concurrent misses for
    /// the same key collapse to a single remote fetch.
    #[instrument(skip(self))]
    pub async fn get_survey_data(&self, sheet_key: &str) -> ImportResult<SheetSnapshot> {
        if let Some(snapshot) = self.cache.get(sheet_key).await {
            info!(sheet = sheet_key, "serving sheet from cache");
            return Ok(snapshot);
        }

        let guard = self.cache.flight_guard(sheet_key).await;
        let _flight = guard.lock().await;

        // Another caller may have filled the entry while this one
        // waited on the guard.
        if let Some(snapshot) = self.cache.get(sheet_key).await {
            info!(sheet = sheet_key, "serving sheet filled by concurrent fetch");
            return Ok(snapshot);
        }

        info!(sheet = sheet_key, "cache miss, fetching fresh data");
        let snapshot = self.fetch_and_normalize(sheet_key).await?;
        self.cache.insert(sheet_key, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Invalidate one cache entry, or every entry when None.
    pub async fn refresh(&self, sheet_key: Option<&str>) {
        match sheet_key {
            Some(key) => {
                info!(sheet = key, "cache entry invalidated");
                self.cache.invalidate(key).await;
            }
            None => {
                info!("cache cleared");
                self.cache.invalidate_all().await;
            }
        }
    }

    /// Sheet inventory, from the last fetch when available.
    pub async fn available_sheets(&self) -> ImportResult<Vec<String>> {
        if let Some(sheets) = self.known_sheets.read().await.clone() {
            return Ok(sheets);
        }
        let workbook = self.fetch_workbook().await?;
        Ok(workbook.sheet_names())
    }

    /// Remote fetches performed over this service's lifetime.
    pub fn total_fetches(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of cached snapshots, fresh or stale.
    pub async fn cached_snapshot_count(&self) -> usize {
        self.cache.len().await
    }

    async fn fetch_workbook(&self) -> ImportResult<Workbook> {
        let workbook = self.source.fetch_workbook().await?;
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        *self.known_sheets.write().await = Some(workbook.sheet_names());
        Ok(workbook)
    }

    async fn fetch_and_normalize(&self, sheet_key: &str) -> ImportResult<SheetSnapshot> {
        let workbook = self.fetch_workbook().await?;

        if sheet_key == ALL_SHEET_KEY {
            return self.aggregate_device_sheets(&workbook);
        }

        let sheet = workbook.sheet(sheet_key).ok_or_else(|| ImportError::SheetNotFound {
            sheet: sheet_key.to_string(),
            available: workbook.sheet_names(),
        })?;

        let normalized = normalize_sheet(sheet, &NormalizerOptions::default());
        let skipped_rows = normalized.skipped.len();
        let header_report = normalized.header_report.clone();
        let report = validate_batch(normalized.devices);

        info!(
            sheet = sheet_key,
            total = report.stats.total,
            valid = report.stats.valid,
            invalid = report.stats.invalid,
            rate = report.stats.validation_rate,
            "normalization complete"
        );

        Ok(SheetSnapshot {
            devices: report.valid_devices,
            invalid_devices: report.invalid_devices,
            stats: report.stats,
            metadata: SnapshotMetadata {
                sheet_name: sheet_key.to_string(),
                source_sheets: vec![sheet_key.to_string()],
                header_report: Some(header_report),
                skipped_rows,
                fetched_at: Utc::now(),
            },
        })
    }

    /// Build the "All" pseudo-sheet: every sheet whose name names a
    /// device type, with the sheet name overriding row-level type
    /// inference. Sheet naming upstream is inconsistent, but when a
    /// sheet is clearly single-type the name is authoritative.
    fn aggregate_device_sheets(&self, workbook: &Workbook) -> ImportResult<SheetSnapshot> {
        let mut all_devices = Vec::new();
        let mut source_sheets = Vec::new();
        let mut skipped_rows = 0;

        for sheet in &workbook.sheets {
            let Some(device_type) = infer_sheet_device_type(&sheet.name) else {
                continue;
            };

            let options = NormalizerOptions::with_override(device_type.label());
            let normalized = normalize_sheet(sheet, &options);
            if !normalized.skipped.is_empty() {
                warn!(
                    sheet = %sheet.name,
                    skipped = normalized.skipped.len(),
                    "rows skipped during normalization"
                );
            }
            skipped_rows += normalized.skipped.len();
            all_devices.extend(normalized.devices);
            source_sheets.push(sheet.name.clone());
        }

        let report = validate_batch(all_devices);

        info!(
            sheets = source_sheets.len(),
            total = report.stats.total,
            valid = report.stats.valid,
            invalid = report.stats.invalid,
            "aggregated device sheets"
        );

        Ok(SheetSnapshot {
            devices: report.valid_devices,
            invalid_devices: report.invalid_devices,
            stats: report.stats,
            metadata: SnapshotMetadata {
                sheet_name: ALL_SHEET_KEY.to_string(),
                source_sheets,
                header_report: None,
                skipped_rows,
                fetched_at: Utc::now(),
            },
        })
    }
}

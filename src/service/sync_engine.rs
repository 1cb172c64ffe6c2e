// ==========================================
// Water Survey Catalog - Sync Engine
// ==========================================
// Reconciles the freshly normalized device set against the
// persisted catalog. State machine per run:
//   running -> success | failed | warning
// The sync_history row is finalized on every path; a run is
// never left in `running`, and a failure propagates to the
// caller after bookkeeping.
// ==========================================

use crate::domain::device::DevicePayload;
use crate::domain::sync::{AuditEntry, SyncOutcome, SyncRun};
use crate::domain::types::SyncStatus;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::repository::{AuditLogRepository, DeviceRepository, SyncHistoryRepository};
use crate::service::source::SheetSource;
use crate::service::survey_service::{SurveyService, ALL_SHEET_KEY};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Upsert chunk size; the store bounds request sizes.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

// ==========================================
// SyncError
// ==========================================
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// SyncEngine
// ==========================================
pub struct SyncEngine<S: SheetSource> {
    survey: Arc<SurveyService<S>>,
    devices: Arc<dyn DeviceRepository>,
    history: Arc<dyn SyncHistoryRepository>,
    audit: Arc<dyn AuditLogRepository>,
    chunk_size: usize,
    // Overlapping runs racing on the same survey_id would corrupt
    // the bookkeeping; one run at a time per engine.
    run_lock: Mutex<()>,
}

impl<S: SheetSource> SyncEngine<S> {
    pub fn new(
        survey: Arc<SurveyService<S>>,
        devices: Arc<dyn DeviceRepository>,
        history: Arc<dyn SyncHistoryRepository>,
        audit: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            survey,
            devices,
            history,
            audit,
            chunk_size: DEFAULT_CHUNK_SIZE,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Execute one reconciliation pass.
    ///
    /// `triggered_by` names the acting identity; None marks a
    /// system-triggered run (audit entries get a null actor).
    #[instrument(skip(self), fields(run_id))]
    pub async fn run(&self, triggered_by: Option<&str>) -> Result<SyncOutcome, SyncError> {
        let _serial = self.run_lock.lock().await;
        let started = Instant::now();

        let run = SyncRun::begin(triggered_by.map(str::to_string));
        tracing::Span::current().record("run_id", run.run_id.as_str());
        self.history.insert_run(&run).await?;
        info!(run_id = %run.run_id, "sync run started");

        match self.execute(&run, triggered_by).await {
            Ok(outcome) => {
                self.history
                    .finalize_run(&run.run_id, outcome.status, outcome.devices_upserted, None)
                    .await?;
                info!(
                    run_id = %run.run_id,
                    status = %outcome.status,
                    upserted = outcome.devices_upserted,
                    audited = outcome.audited_changes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "sync run finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(run_id = %run.run_id, error = %e, "sync run failed");
                // Bookkeeping before propagation; a finalize failure
                // is logged rather than masking the original error.
                if let Err(finalize_err) = self
                    .history
                    .finalize_run(&run.run_id, SyncStatus::Failed, 0, Some(&e.to_string()))
                    .await
                {
                    error!(run_id = %run.run_id, error = %finalize_err, "failed to finalize sync run");
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run: &SyncRun,
        triggered_by: Option<&str>,
    ) -> Result<SyncOutcome, SyncError> {
        // 1. Fetch + normalize + validate every device sheet
        let snapshot = self.survey.get_survey_data(ALL_SHEET_KEY).await?;

        if snapshot.devices.is_empty() {
            warn!(run_id = %run.run_id, "no valid devices in source, nothing to sync");
            return Ok(SyncOutcome {
                run_id: run.run_id.clone(),
                status: SyncStatus::Warning,
                devices_processed: 0,
                devices_upserted: 0,
                audited_changes: 0,
            });
        }

        // 2. Build persistence payloads (transient fields dropped)
        let payloads: Vec<DevicePayload> = snapshot
            .devices
            .iter()
            .filter_map(DevicePayload::from_device)
            .collect();

        // 3. Field-level diff against the persisted set; every
        //    changed field of an existing record is audited before
        //    it gets overwritten
        let existing = self.devices.all_by_survey_id().await?;
        let mut audit_entries: Vec<AuditEntry> = Vec::new();
        for payload in &payloads {
            if let Some(prior) = existing.get(&payload.survey_id) {
                for change in payload.diff_against(prior) {
                    audit_entries.push(AuditEntry::field_update(
                        &payload.survey_id,
                        change.field,
                        change.old_value,
                        change.new_value,
                        triggered_by.map(str::to_string),
                    ));
                }
            }
        }
        if !audit_entries.is_empty() {
            self.audit.insert_entries(&audit_entries).await?;
        }

        // 4. Chunked upsert keyed by survey_id
        let mut upserted = 0;
        for chunk in payloads.chunks(self.chunk_size) {
            upserted += self.devices.upsert_batch(chunk).await?;
        }

        info!(
            run_id = %run.run_id,
            processed = payloads.len(),
            upserted,
            audited = audit_entries.len(),
            "device upsert complete"
        );

        Ok(SyncOutcome {
            run_id: run.run_id.clone(),
            status: SyncStatus::Success,
            devices_processed: payloads.len(),
            devices_upserted: upserted,
            audited_changes: audit_entries.len(),
        })
    }
}

// ==========================================
// Water Survey Catalog - Sync Domain Model
// ==========================================
// Bookkeeping records for reconciliation runs and the
// per-field audit trail. Both are handed to the store
// and owned by it afterwards: sync history is append-only
// and audit entries are immutable once written.
// ==========================================

use crate::domain::types::SyncStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// SyncRun - one reconciliation pass
// ==========================================
// Created in `running` state before any work happens,
// finalized exactly once. A run must never be left
// stuck in `running`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub run_id: String,
    pub status: SyncStatus,
    pub triggered_by: Option<String>, // None for scheduler/system runs
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub devices_synced: usize,
    pub error_message: Option<String>,
}

impl SyncRun {
    /// Open a new run in `running` state.
    pub fn begin(triggered_by: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            status: SyncStatus::Running,
            triggered_by,
            started_at: Utc::now(),
            finished_at: None,
            devices_synced: 0,
            error_message: None,
        }
    }
}

// ==========================================
// AuditEntry - one recorded mutation
// ==========================================
// Emitted only when reconciliation detects and applies a
// change to a persisted field. actor is None when the
// mutation was system-triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String,
    pub operation: String,  // e.g. "UPDATE"
    pub table_name: String, // e.g. "devices"
    pub record_id: String,  // survey_id of the target device
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn field_update(
        record_id: &str,
        field: &str,
        old_value: Option<String>,
        new_value: Option<String>,
        actor: Option<String>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4().to_string(),
            operation: "UPDATE".to_string(),
            table_name: "devices".to_string(),
            record_id: record_id.to_string(),
            field: field.to_string(),
            old_value,
            new_value,
            actor,
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// SyncOutcome - caller-facing result
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub run_id: String,
    pub status: SyncStatus,
    pub devices_processed: usize,
    pub devices_upserted: usize,
    pub audited_changes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_opens_running_run() {
        let run = SyncRun::begin(Some("operator".to_string()));
        assert_eq!(run.status, SyncStatus::Running);
        assert!(run.finished_at.is_none());
        assert_eq!(run.devices_synced, 0);
        assert!(!run.run_id.is_empty());
    }

    #[test]
    fn test_field_update_entry() {
        let entry = AuditEntry::field_update(
            "BW-01",
            "status",
            Some("Working".to_string()),
            Some("Failed".to_string()),
            None,
        );
        assert_eq!(entry.operation, "UPDATE");
        assert_eq!(entry.table_name, "devices");
        assert_eq!(entry.record_id, "BW-01");
        assert!(entry.actor.is_none());
    }
}

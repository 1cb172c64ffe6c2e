// ==========================================
// Water Survey Catalog - Domain Layer
// ==========================================
// Entities and closed types. No I/O, no business
// orchestration.
// ==========================================

pub mod device;
pub mod sync;
pub mod types;

pub use device::{
    CanonicalDevice, DevicePayload, DeviceRecord, FieldChange, InvalidDevice, ValidationStats,
};
pub use sync::{AuditEntry, SyncOutcome, SyncRun};
pub use types::{DeviceStatus, DeviceType, ErrorCategory, SyncStatus};

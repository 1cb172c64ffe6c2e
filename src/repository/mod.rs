// ==========================================
// Water Survey Catalog - Repository Layer
// ==========================================
// Data access only. The pipeline talks to the store
// through these traits and nothing else: equality
// filters, ordering, limit/offset, upsert.
// ==========================================

pub mod audit_log_repo;
pub mod device_repo;
pub mod error;
pub mod sync_history_repo;

pub use audit_log_repo::{AuditLogRepository, SqliteAuditLogRepository};
pub use device_repo::{DeviceRepository, SqliteDeviceRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use sync_history_repo::{SqliteSyncHistoryRepository, SyncHistoryRepository};

// ==========================================
// Water Survey Catalog - Service Layer
// ==========================================
// Orchestration over the import layer and the store:
// fetch/cache, and reconciliation.
// ==========================================

pub mod cache;
pub mod source;
pub mod survey_service;
pub mod sync_engine;

pub use cache::SheetCache;
pub use source::{FileWorkbookSource, RemoteWorkbookSource, SheetSource};
pub use survey_service::{
    infer_sheet_device_type, SheetSnapshot, SnapshotMetadata, SurveyService, ALL_SHEET_KEY,
};
pub use sync_engine::{SyncEngine, SyncError, DEFAULT_CHUNK_SIZE};

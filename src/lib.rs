// ==========================================
// Water Survey Catalog - Core Library
// ==========================================
// Ingests a third-party survey spreadsheet of water
// infrastructure assets (borewells, sumps, overhead
// tanks) and reconciles it into a durable device catalog.
// Stack: Rust + SQLite
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Import layer - external spreadsheet -> canonical records
pub mod importer;

// Service layer - fetch/cache orchestration and sync
pub mod service;

// Repository layer - data access
pub mod repository;

// Configuration
pub mod config;

// Database infrastructure (connection setup / schema bootstrap)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{DeviceStatus, DeviceType, ErrorCategory, SyncStatus};

// Domain entities
pub use domain::{
    AuditEntry, CanonicalDevice, DevicePayload, DeviceRecord, InvalidDevice, SyncOutcome, SyncRun,
    ValidationStats,
};

// Pipeline
pub use importer::{BatchReport, ImportError, ImportResult, NormalizerOptions, Workbook};

// Services
pub use service::{
    FileWorkbookSource, RemoteWorkbookSource, SheetSnapshot, SheetSource, SurveyService,
    SyncEngine, SyncError, ALL_SHEET_KEY,
};

// Repositories
pub use repository::{
    AuditLogRepository, DeviceRepository, SqliteAuditLogRepository, SqliteDeviceRepository,
    SqliteSyncHistoryRepository, SyncHistoryRepository,
};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// System name
pub const APP_NAME: &str = "Water Survey Catalog";

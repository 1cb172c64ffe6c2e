// ==========================================
// Water Survey Catalog - Domain Types
// ==========================================
// Closed enumerations for device classification,
// operational status, sync state and the validation
// error taxonomy.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Device Type
// ==========================================
// Canonical labels as they appear in the catalog.
// The sanitizer folds source spellings onto these; the
// validator checks membership against `allowed_labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Borewell,
    Sump,
    Oht,
    Ohsr,
    OverheadTank,
}

impl DeviceType {
    /// Canonical label stored in the catalog.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Borewell => "Borewell",
            DeviceType::Sump => "Sump",
            DeviceType::Oht => "OHT",
            DeviceType::Ohsr => "OHSR",
            DeviceType::OverheadTank => "Overhead Tank",
        }
    }

    /// Every label the validator accepts for `device_type`.
    pub fn allowed_labels() -> &'static [&'static str] {
        &["Borewell", "Sump", "OHT", "OHSR", "Overhead Tank"]
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// Device Status
// ==========================================
// Nullable on devices whose type has no status concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    Working,
    NotWorking,
    OnRepair,
    Failed,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Working => "Working",
            DeviceStatus::NotWorking => "Not Working",
            DeviceStatus::OnRepair => "On Repair",
            DeviceStatus::Failed => "Failed",
        }
    }

    /// Every label the validator accepts for `status`.
    pub fn allowed_labels() -> &'static [&'static str] {
        &["Working", "Not Working", "On Repair", "Failed"]
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// Sync Run Status
// ==========================================
// Lifecycle: Running -> Success | Failed | Warning.
// Warning means the source yielded zero usable devices.
// Serialized lowercase, matching the sync_history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Success,
    Failed,
    Warning,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Running => "running",
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Warning => "warning",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Validation Error Taxonomy
// ==========================================
// Fixed buckets for the error histogram. Every error
// message classifies into exactly one bucket; unmatched
// messages fall into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    MissingCoordinates,
    MissingRequiredField,
    CoordinateOutOfRange,
    InvalidDeviceType,
    InvalidStatus,
    NumericRangeViolation,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MissingCoordinates => "missing_coordinates",
            ErrorCategory::MissingRequiredField => "missing_required_field",
            ErrorCategory::CoordinateOutOfRange => "coordinate_out_of_range",
            ErrorCategory::InvalidDeviceType => "invalid_device_type",
            ErrorCategory::InvalidStatus => "invalid_status",
            ErrorCategory::NumericRangeViolation => "numeric_range_violation",
            ErrorCategory::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Water Survey Catalog - Batch Validator
// ==========================================
// Business rules over normalized devices. Failures are
// data, never exceptions: a row with errors is quarantined
// with its error list attached and the batch continues.
// ==========================================

use crate::domain::device::{CanonicalDevice, InvalidDevice, ValidationStats};
use crate::domain::types::{DeviceStatus, DeviceType, ErrorCategory};
use std::collections::BTreeMap;
use tracing::warn;

const LAT_MIN: f64 = -90.0;
const LAT_MAX: f64 = 90.0;
const LNG_MIN: f64 = -180.0;
const LNG_MAX: f64 = 180.0;

// Numeric attribute bounds, re-checked here even though the
// sanitizer already nulls out-of-bounds parses: a validator
// error is reportable per-row, a sanitizer null is silent.
const NUMERIC_RULES: &[(&str, f64, f64)] = &[
    ("houses", 0.0, 10000.0),
    ("usage_hours", 0.0, 24.0),
    ("pipe_size", 0.0, 100.0),
    ("motor_hp", 0.0, 1000.0),
];

// ==========================================
// BatchReport - validator output
// ==========================================
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub valid_devices: Vec<CanonicalDevice>,
    pub invalid_devices: Vec<InvalidDevice>,
    pub stats: ValidationStats,
}

/// Validate one normalized device. Empty vec means valid.
pub fn validate_row(device: &CanonicalDevice) -> Vec<String> {
    let mut errors = Vec::new();

    // Required fields (non-null semantics)
    if device.survey_id.is_none() {
        errors.push("Missing required field: survey_id".to_string());
    }
    if device.lat.is_none() {
        errors.push("Missing required field: lat".to_string());
    }
    if device.lng.is_none() {
        errors.push("Missing required field: lng".to_string());
    }

    // GPS ranges, each reported independently so a bad latitude
    // and a bad longitude both show up on the same row
    if let Some(lat) = device.lat {
        if !(LAT_MIN..=LAT_MAX).contains(&lat) {
            errors.push(format!(
                "Latitude out of range: {:?} (must be -90 to 90)",
                lat
            ));
        }
    }
    if let Some(lng) = device.lng {
        if !(LNG_MIN..=LNG_MAX).contains(&lng) {
            errors.push(format!(
                "Longitude out of range: {:?} (must be -180 to 180)",
                lng
            ));
        }
    }

    // Enumeration membership; null is always acceptable
    if let Some(device_type) = &device.device_type {
        if !DeviceType::allowed_labels().contains(&device_type.as_str()) {
            errors.push(format!(
                "Unknown device type: '{}' (allowed: {})",
                device_type,
                DeviceType::allowed_labels().join(", ")
            ));
        }
    }
    if let Some(status) = &device.status {
        if !DeviceStatus::allowed_labels().contains(&status.as_str()) {
            errors.push(format!(
                "Unknown status: '{}' (allowed: {})",
                status,
                DeviceStatus::allowed_labels().join(", ")
            ));
        }
    }

    // Numeric attribute ranges, where present
    for (field, min, max) in NUMERIC_RULES {
        let value = match *field {
            "houses" => device.houses.map(|v| v as f64),
            "usage_hours" => device.usage_hours,
            "pipe_size" => device.pipe_size,
            "motor_hp" => device.motor_hp,
            _ => None,
        };
        if let Some(value) = value {
            if value < *min {
                errors.push(format!("{} below minimum: {:?} < {:?}", field, value, min));
            }
            if value > *max {
                errors.push(format!("{} above maximum: {:?} > {:?}", field, value, max));
            }
        }
    }

    errors
}

/// Classify an error message into exactly one taxonomy bucket.
/// First matching rule wins; unmatched messages land in Other.
pub fn categorize_error(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if lower.contains("missing")
        && (lower.contains("lat")
            || lower.contains("lng")
            || lower.contains("gps")
            || lower.contains("coordinate"))
    {
        ErrorCategory::MissingCoordinates
    } else if lower.contains("missing required field") {
        ErrorCategory::MissingRequiredField
    } else if lower.contains("out of range") {
        ErrorCategory::CoordinateOutOfRange
    } else if lower.contains("unknown device type") {
        ErrorCategory::InvalidDeviceType
    } else if lower.contains("unknown status") {
        ErrorCategory::InvalidStatus
    } else if lower.contains("below minimum") || lower.contains("above maximum") {
        ErrorCategory::NumericRangeViolation
    } else {
        ErrorCategory::Other
    }
}

/// Partition a normalized batch into valid and quarantined sets
/// and compute aggregate statistics.
pub fn validate_batch(devices: Vec<CanonicalDevice>) -> BatchReport {
    let total = devices.len();
    let mut valid_devices = Vec::with_capacity(total);
    let mut invalid_devices = Vec::new();
    let mut error_breakdown: BTreeMap<ErrorCategory, usize> = BTreeMap::new();

    for device in devices {
        let errors = validate_row(&device);
        if errors.is_empty() {
            valid_devices.push(device);
        } else {
            warn!(
                row_index = device.row_index,
                errors = %errors.join("; "),
                "row quarantined"
            );
            for error in &errors {
                *error_breakdown.entry(categorize_error(error)).or_insert(0) += 1;
            }
            invalid_devices.push(InvalidDevice {
                device,
                validation_errors: errors,
            });
        }
    }

    let valid = valid_devices.len();
    let invalid = invalid_devices.len();
    let validation_rate = if total > 0 {
        (valid as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    };

    BatchReport {
        valid_devices,
        invalid_devices,
        stats: ValidationStats {
            total,
            valid,
            invalid,
            validation_rate,
            error_breakdown,
        },
    }
}

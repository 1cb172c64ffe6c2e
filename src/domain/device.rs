// ==========================================
// Water Survey Catalog - Device Domain Model
// ==========================================
// One flat record shape per surveyed asset. Device-type
// specific attributes share the same optional-field set
// so the record shape is uniform across Borewell / Sump /
// OHSR rows; unused fields stay null rather than being
// omitted.
// ==========================================

use crate::domain::types::ErrorCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CanonicalDevice - normalized survey row
// ==========================================
// Produced by the row normalizer, one per source row.
// Carries no timestamps: normalizing the same raw row
// twice must yield identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDevice {
    // ===== Identification =====
    pub survey_id: Option<String>, // stable external identifier
    pub original_name: Option<String>,

    // ===== Location =====
    pub zone: Option<String>,
    pub street: Option<String>,

    // ===== Classification =====
    pub device_type: Option<String>, // canonical label, validator-checked
    pub status: Option<String>,      // nullable for types without a status

    // ===== GPS coordinates =====
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    // ===== Well attributes =====
    pub houses: Option<i64>,      // houses connected
    pub usage_hours: Option<f64>, // daily usage hours
    pub pipe_size: Option<f64>,   // inches
    pub motor_hp: Option<f64>,
    pub depth_ft: Option<f64>,

    // ===== Tank / sump attributes =====
    pub capacity: Option<String>, // free-text in the source ("50000 Ltrs")
    pub tank_height_m: Option<f64>,
    pub tank_material: Option<String>,

    // ===== Maintenance =====
    pub notes: Option<String>,

    // ===== Traceability =====
    // Spreadsheet row number as a human would count it
    // (1-based data rows, header row accounted for).
    // Never an identity field.
    pub row_index: usize,
}

// ==========================================
// InvalidDevice - quarantined row
// ==========================================
// A normalized row that failed one or more validation
// rules, retained with its errors for inspection. Never
// persisted to the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidDevice {
    #[serde(flatten)]
    pub device: CanonicalDevice,
    pub validation_errors: Vec<String>,
}

// ==========================================
// ValidationStats - per-batch aggregates
// ==========================================
// Recomputed on every pipeline run, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// valid / total * 100, rounded to 2 decimals; 0 for an empty batch.
    pub validation_rate: f64,
    pub error_breakdown: BTreeMap<ErrorCategory, usize>,
}

impl ValidationStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            valid: 0,
            invalid: 0,
            validation_rate: 0.0,
            error_breakdown: BTreeMap::new(),
        }
    }
}

// ==========================================
// DevicePayload - persistence shape
// ==========================================
// What the sync engine hands to the store: a valid
// CanonicalDevice minus transient fields (row_index).
// survey_id is guaranteed present by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub survey_id: String,
    pub original_name: Option<String>,
    pub zone: Option<String>,
    pub street: Option<String>,
    pub device_type: Option<String>,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub houses: Option<i64>,
    pub usage_hours: Option<f64>,
    pub pipe_size: Option<f64>,
    pub motor_hp: Option<f64>,
    pub depth_ft: Option<f64>,
    pub capacity: Option<String>,
    pub tank_height_m: Option<f64>,
    pub tank_material: Option<String>,
    pub notes: Option<String>,
}

impl DevicePayload {
    /// Build the persistence payload from a validated device.
    ///
    /// Returns None when survey_id is absent; callers only pass
    /// devices that already cleared validation.
    pub fn from_device(device: &CanonicalDevice) -> Option<Self> {
        Some(Self {
            survey_id: device.survey_id.clone()?,
            original_name: device.original_name.clone(),
            zone: device.zone.clone(),
            street: device.street.clone(),
            device_type: device.device_type.clone(),
            status: device.status.clone(),
            lat: device.lat,
            lng: device.lng,
            houses: device.houses,
            usage_hours: device.usage_hours,
            pipe_size: device.pipe_size,
            motor_hp: device.motor_hp,
            depth_ft: device.depth_ft,
            capacity: device.capacity.clone(),
            tank_height_m: device.tank_height_m,
            tank_material: device.tank_material.clone(),
            notes: device.notes.clone(),
        })
    }

    /// Field-level diff against the persisted record.
    ///
    /// Returns (field name, old value, new value) for every mutable
    /// field whose stored value differs from the incoming one.
    /// survey_id is the upsert key and never diffed.
    pub fn diff_against(&self, prior: &DeviceRecord) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        fn text(field: &'static str, old: &Option<String>, new: &Option<String>, out: &mut Vec<FieldChange>) {
            if old != new {
                out.push(FieldChange {
                    field,
                    old_value: old.clone(),
                    new_value: new.clone(),
                });
            }
        }

        fn float(field: &'static str, old: Option<f64>, new: Option<f64>, out: &mut Vec<FieldChange>) {
            if old != new {
                out.push(FieldChange {
                    field,
                    old_value: old.map(|v| v.to_string()),
                    new_value: new.map(|v| v.to_string()),
                });
            }
        }

        fn int(field: &'static str, old: Option<i64>, new: Option<i64>, out: &mut Vec<FieldChange>) {
            if old != new {
                out.push(FieldChange {
                    field,
                    old_value: old.map(|v| v.to_string()),
                    new_value: new.map(|v| v.to_string()),
                });
            }
        }

        text("original_name", &prior.payload.original_name, &self.original_name, &mut changes);
        text("zone", &prior.payload.zone, &self.zone, &mut changes);
        text("street", &prior.payload.street, &self.street, &mut changes);
        text("device_type", &prior.payload.device_type, &self.device_type, &mut changes);
        text("status", &prior.payload.status, &self.status, &mut changes);
        float("lat", prior.payload.lat, self.lat, &mut changes);
        float("lng", prior.payload.lng, self.lng, &mut changes);
        int("houses", prior.payload.houses, self.houses, &mut changes);
        float("usage_hours", prior.payload.usage_hours, self.usage_hours, &mut changes);
        float("pipe_size", prior.payload.pipe_size, self.pipe_size, &mut changes);
        float("motor_hp", prior.payload.motor_hp, self.motor_hp, &mut changes);
        float("depth_ft", prior.payload.depth_ft, self.depth_ft, &mut changes);
        text("capacity", &prior.payload.capacity, &self.capacity, &mut changes);
        float("tank_height_m", prior.payload.tank_height_m, self.tank_height_m, &mut changes);
        text("tank_material", &prior.payload.tank_material, &self.tank_material, &mut changes);
        text("notes", &prior.payload.notes, &self.notes, &mut changes);

        changes
    }
}

/// One detected field mutation, input to the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

// ==========================================
// DeviceRecord - persisted read model
// ==========================================
// Payload plus the store-owned bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(flatten)]
    pub payload: DevicePayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

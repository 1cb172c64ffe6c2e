// ==========================================
// Water Survey Catalog - Sheet Cache
// ==========================================
// Time-boxed memo of normalized snapshots, keyed by sheet.
// An explicit injected service rather than ambient state:
// unit tests stay deterministic and the stampede concern
// has somewhere to live. Expired entries are returned as
// misses but never evicted by a failed refresh, so stale
// data survives a source outage.
// ==========================================

use crate::service::survey_service::SheetSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct CacheEntry {
    snapshot: SheetSnapshot,
    expires_at: Instant,
}

// ==========================================
// SheetCache
// ==========================================
pub struct SheetCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    // One guard per key; concurrent misses for the same sheet
    // collapse to a single fetch.
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Unexpired snapshot for the key, if any.
    pub async fn get(&self, key: &str) -> Option<SheetSnapshot> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            debug!(sheet = key, "cache entry expired");
            return None;
        }
        Some(entry.snapshot.clone())
    }

    pub async fn insert(&self, key: &str, snapshot: SheetSnapshot) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                snapshot,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Per-key single-flight guard. Hold the lock across the
    /// fetch-and-fill; waiters re-check the cache once they
    /// acquire it.
    pub async fn flight_guard(&self, key: &str) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop one entry (manual refresh).
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Drop everything (manual refresh of the whole workbook).
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::ValidationStats;
    use crate::service::survey_service::SnapshotMetadata;
    use chrono::Utc;

    fn snapshot(sheet: &str) -> SheetSnapshot {
        SheetSnapshot {
            devices: Vec::new(),
            invalid_devices: Vec::new(),
            stats: ValidationStats::empty(),
            metadata: SnapshotMetadata {
                sheet_name: sheet.to_string(),
                source_sheets: vec![sheet.to_string()],
                header_report: None,
                skipped_rows: 0,
                fetched_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = SheetCache::new(Duration::from_secs(60));
        cache.insert("All", snapshot("All")).await;

        let hit = cache.get("All").await;
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().metadata.sheet_name, "All");
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_but_not_evicted() {
        let cache = SheetCache::new(Duration::from_millis(0));
        cache.insert("All", snapshot("All")).await;

        assert!(cache.get("All").await.is_none());
        // the entry itself is still there; a failed refresh must
        // not have cleared it
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_single_and_all() {
        let cache = SheetCache::new(Duration::from_secs(60));
        cache.insert("Borewell", snapshot("Borewell")).await;
        cache.insert("Sumps", snapshot("Sumps")).await;

        cache.invalidate("Borewell").await;
        assert!(cache.get("Borewell").await.is_none());
        assert!(cache.get("Sumps").await.is_some());

        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_flight_guard_is_shared_per_key() {
        let cache = SheetCache::new(Duration::from_secs(60));
        let a = cache.flight_guard("All").await;
        let b = cache.flight_guard("All").await;
        let other = cache.flight_guard("Sumps").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }
}

//! Versioned immutable snapshots and the handle they are published through.
//!
//! A [`Snapshot`] owns one region store, one point store and the index built
//! over them. Reloading reserves a version, builds a whole new snapshot
//! outside any lock and then swaps the pointer in [`SnapshotCell`]. Readers clone the `Arc` and query
//! without holding the lock, so a query that started on the old snapshot
//! finishes on it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::index::{IndexConfig, SpatialIndex};
use super::resolver::ContainmentResolver;
use super::store::{PointStore, RegionStore};
use crate::error::{FenceError, Result};

/// One consistent (regions, points, index) triple.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    loaded_at: DateTime<Utc>,
    regions: RegionStore,
    points: PointStore,
    index: SpatialIndex,
}

impl Snapshot {
    /// Index the stores under a version from [`SnapshotCell::reserve_version`].
    pub fn build(
        version: u64,
        regions: RegionStore,
        points: PointStore,
        config: &IndexConfig,
    ) -> Self {
        let index = SpatialIndex::build(&regions, &points, config);
        Self {
            version,
            loaded_at: Utc::now(),
            regions,
            points,
            index,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn regions(&self) -> &RegionStore {
        &self.regions
    }

    pub fn points(&self) -> &PointStore {
        &self.points
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn resolver(&self) -> ContainmentResolver<'_> {
        ContainmentResolver::new(&self.regions, &self.points, &self.index)
    }
}

/// Holder of the current snapshot.
///
/// The lock only guards the pointer copy; nothing is built or queried while
/// it is held. Versions are handed out when a load starts, so concurrent
/// loads publish in start order and a slow older load never replaces a
/// newer snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Option<Arc<Snapshot>>>,
    last_version: AtomicU64,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, or `IndexUnavailable` before the first publish.
    pub fn current(&self) -> Result<Arc<Snapshot>> {
        // A poisoned guard still holds a whole pointer
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().cloned().ok_or(FenceError::IndexUnavailable)
    }

    /// Next version number, starting at 1.
    pub fn reserve_version(&self) -> u64 {
        self.last_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make `snapshot` current unless a newer version is already published.
    /// Returns whether the swap happened.
    pub fn publish(&self, snapshot: Snapshot) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = guard.as_ref() {
            if current.version >= snapshot.version {
                let current_version = current.version;
                drop(guard);
                warn!(
                    "Dropping snapshot v{}: v{} is already published",
                    snapshot.version, current_version
                );
                return false;
            }
        }

        let (version, regions, points) =
            (snapshot.version, snapshot.regions.len(), snapshot.points.len());
        *guard = Some(Arc::new(snapshot));
        drop(guard);

        info!(
            "Published snapshot v{}: {} regions, {} points",
            version, regions, points
        );
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_ok()
    }
}

//! Query façade called by the external layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::index::IndexConfig;
use super::resolver::LocationPoints;
use super::snapshot::{Snapshot, SnapshotCell};
use super::store::{PointStore, RegionStore};
use crate::error::{FenceError, Result};
use crate::models::{Coordinate, PointRecord, Region, RegionRecord};

/// Identifier of an accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Accepted {
    Region(String),
    Point(String),
}

/// A record refused at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectedRecord {
    Region(RegionRecord),
    Point(PointRecord),
}

impl RejectedRecord {
    pub fn id(&self) -> &str {
        match self {
            RejectedRecord::Region(r) => &r.id,
            RejectedRecord::Point(p) => &p.id,
        }
    }
}

/// Outcome of one [`QueryService::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Version reserved for this load
    pub version: u64,
    /// False when a load that started later had already published
    pub published: bool,
    pub accepted: Vec<Accepted>,
    pub rejected: Vec<(RejectedRecord, FenceError)>,
}

/// Counts for the current snapshot, used by liveness checks.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub regions: usize,
    pub points: usize,
}

impl Health {
    /// A liveness check treats an empty region store as not serving.
    pub fn is_serving(&self) -> bool {
        self.regions > 0
    }
}

/// Stateless query façade over a shared [`SnapshotCell`].
#[derive(Debug, Clone)]
pub struct QueryService {
    snapshots: Arc<SnapshotCell>,
    config: IndexConfig,
}

impl QueryService {
    pub fn new(snapshots: Arc<SnapshotCell>, config: IndexConfig) -> Self {
        Self { snapshots, config }
    }

    /// Validate both record sets, build a snapshot and publish it.
    ///
    /// Rejected records are reported, never fatal. An all-rejected load still
    /// publishes an empty snapshot.
    pub fn load(&self, regions: Vec<RegionRecord>, points: Vec<PointRecord>) -> LoadReport {
        let version = self.snapshots.reserve_version();
        let region_load = RegionStore::load(regions);
        let point_load = PointStore::load(points);

        let mut report = LoadReport {
            version,
            ..LoadReport::default()
        };
        report.accepted.extend(
            region_load
                .store
                .all()
                .iter()
                .map(|r| Accepted::Region(r.id.clone())),
        );
        report.accepted.extend(
            point_load
                .store
                .all()
                .iter()
                .map(|p| Accepted::Point(p.id.clone())),
        );
        report.rejected.extend(
            region_load
                .rejected
                .into_iter()
                .map(|(record, reason)| (RejectedRecord::Region(record), reason)),
        );
        report.rejected.extend(
            point_load
                .rejected
                .into_iter()
                .map(|(record, reason)| (RejectedRecord::Point(record), reason)),
        );

        let snapshot = Snapshot::build(version, region_load.store, point_load.store, &self.config);
        report.published = self.snapshots.publish(snapshot);

        info!(
            "Load v{} complete: {} accepted, {} rejected",
            report.version,
            report.accepted.len(),
            report.rejected.len()
        );

        report
    }

    /// Regions containing (`lon`, `lat`). An empty result is not an error.
    pub fn find_area(&self, lon: f64, lat: f64) -> Result<Vec<Arc<Region>>> {
        let point = validate_coordinate(lon, lat)?;
        let snapshot = self.snapshots.current()?;
        Ok(snapshot.resolver().regions_containing(point))
    }

    /// Points of interest inside the region(s) carrying `location_key`.
    pub fn find_points_of_interest(&self, location_key: i64) -> Result<LocationPoints> {
        let snapshot = self.snapshots.current()?;
        let found = snapshot.resolver().points_for_location_key(location_key)?;
        if found.is_ambiguous() {
            debug!(
                "Location key {} matched {} regions; returning union",
                location_key,
                found.regions.len()
            );
        }
        Ok(found)
    }

    pub fn region_by_id(&self, id: &str) -> Result<Arc<Region>> {
        let snapshot = self.snapshots.current()?;
        snapshot.regions().by_id(id).cloned()
    }

    pub fn health(&self) -> Result<Health> {
        let snapshot = self.snapshots.current()?;
        Ok(Health {
            version: snapshot.version(),
            loaded_at: snapshot.loaded_at(),
            regions: snapshot.regions().len(),
            points: snapshot.points().len(),
        })
    }

    /// The snapshot queries currently run against.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshots.current()
    }
}

/// Reject non-finite or out-of-range query coordinates.
pub fn validate_coordinate(lon: f64, lat: f64) -> Result<Coordinate> {
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(FenceError::InvalidArgument(format!(
            "longitude must be finite and within [-180, 180], got {lon}"
        )));
    }
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(FenceError::InvalidArgument(format!(
            "latitude must be finite and within [-90, 90], got {lat}"
        )));
    }
    Ok(Coordinate::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> QueryService {
        QueryService::new(Arc::new(SnapshotCell::new()), IndexConfig::default())
    }

    fn square(key: i64) -> RegionRecord {
        let ring = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)]
            .iter()
            .map(|&(lon, lat)| Coordinate::new(lon, lat))
            .collect();
        RegionRecord::new("square", key, "Square", ring)
    }

    #[test]
    fn test_queries_before_load() {
        let svc = service();
        assert_eq!(svc.find_area(5.0, 5.0).unwrap_err(), FenceError::IndexUnavailable);
        assert_eq!(
            svc.find_points_of_interest(42).unwrap_err(),
            FenceError::IndexUnavailable
        );
        assert_eq!(svc.health().unwrap_err(), FenceError::IndexUnavailable);
    }

    #[test]
    fn test_invalid_arguments() {
        let svc = service();
        svc.load(vec![square(42)], vec![]);
        for (lon, lat) in [(f64::NAN, 0.0), (181.0, 0.0), (0.0, -90.5), (0.0, f64::INFINITY)] {
            assert!(matches!(
                svc.find_area(lon, lat),
                Err(FenceError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_load_report_and_health() {
        let svc = service();
        let report = svc.load(
            vec![square(42)],
            vec![
                PointRecord::new("p1", "Anchor", "pub", Coordinate::new(5.0, 5.0)),
                PointRecord::new("p2", "Lost", "pub", Coordinate::new(5.0, 99.0)),
            ],
        );
        assert_eq!(report.version, 1);
        assert!(report.published);
        assert_eq!(
            report.accepted,
            vec![
                Accepted::Region("square".into()),
                Accepted::Point("p1".into())
            ]
        );
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0.id(), "p2");

        let health = svc.health().unwrap();
        assert_eq!(health.version, 1);
        assert_eq!(health.regions, 1);
        assert_eq!(health.points, 1);
        assert!(health.is_serving());
    }

    #[test]
    fn test_region_by_id() {
        let svc = service();
        svc.load(vec![square(42)], vec![]);
        assert_eq!(svc.region_by_id("square").unwrap().location_key, 42);
        assert!(matches!(
            svc.region_by_id("nope"),
            Err(FenceError::NotFound(_))
        ));
    }
}

//! Immutable region and point-of-interest stores.
//!
//! Both stores validate their records on load. A record that fails validation
//! is skipped and returned to the caller alongside the reason; the rest of the
//! batch still loads.

use std::sync::Arc;

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{info, warn};

use super::geometry::{bounding_box_of, validate_location, validate_ring};
use crate::error::{FenceError, GeometryViolation, Result};
use crate::models::{BoundingBox, PointOfInterest, PointRecord, Region, RegionRecord};

/// A freshly loaded store plus the records it refused.
#[derive(Debug)]
pub struct StoreLoad<S, R> {
    pub store: S,
    pub rejected: Vec<(R, FenceError)>,
}

/// All regions of one snapshot, addressable by position, id and location key.
#[derive(Debug, Default)]
pub struct RegionStore {
    regions: Vec<Arc<Region>>,
    by_id: HashMap<String, usize>,
    by_location_key: HashMap<i64, Vec<usize>>,
    bbox: Option<BoundingBox>,
}

impl RegionStore {
    /// Validate and load region records. Accepted regions keep input order.
    pub fn load(records: Vec<RegionRecord>) -> StoreLoad<Self, RegionRecord> {
        let checked: Vec<(RegionRecord, std::result::Result<BoundingBox, GeometryViolation>)> =
            records
                .into_par_iter()
                .map(|record| {
                    let outcome = check_region(&record);
                    (record, outcome)
                })
                .collect();

        let mut store = RegionStore::default();
        let mut rejected = Vec::new();

        for (record, outcome) in checked {
            let bbox = match outcome {
                Ok(bbox) => bbox,
                Err(violation) => {
                    warn!("Rejected region '{}': {}", record.id, violation);
                    let id = record.id.clone();
                    rejected.push((record, FenceError::InvalidGeometry { id, violation }));
                    continue;
                }
            };

            if store.by_id.contains_key(&record.id) {
                warn!("Rejected region '{}': duplicate id", record.id);
                let id = record.id.clone();
                rejected.push((record, FenceError::DuplicateId(id)));
                continue;
            }

            let position = store.regions.len();
            store.by_id.insert(record.id.clone(), position);
            store
                .by_location_key
                .entry(record.location_key)
                .or_default()
                .push(position);
            store.bbox = Some(match store.bbox {
                Some(total) => total.union(&bbox),
                None => bbox,
            });
            store
                .regions
                .push(Arc::new(Region::from_validated(record, bbox)));
        }

        for (key, positions) in &store.by_location_key {
            if positions.len() > 1 {
                warn!(
                    "Location key {} is shared by {} regions",
                    key,
                    positions.len()
                );
            }
        }

        info!(
            "Loaded {} regions ({} rejected)",
            store.regions.len(),
            rejected.len()
        );

        StoreLoad { store, rejected }
    }

    pub fn all(&self) -> &[Arc<Region>] {
        &self.regions
    }

    /// Region at a store position, as held by the spatial index.
    pub fn get(&self, position: usize) -> Option<&Arc<Region>> {
        self.regions.get(position)
    }

    pub fn by_id(&self, id: &str) -> Result<&Arc<Region>> {
        self.by_id
            .get(id)
            .map(|&position| &self.regions[position])
            .ok_or_else(|| FenceError::NotFound(id.to_string()))
    }

    /// All regions sharing `key`. Uniqueness is not assumed.
    pub fn by_location_key(&self, key: i64) -> Vec<&Arc<Region>> {
        self.by_location_key
            .get(&key)
            .map(|positions| positions.iter().map(|&p| &self.regions[p]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Union of every region's bounding box.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }
}

fn check_region(record: &RegionRecord) -> std::result::Result<BoundingBox, GeometryViolation> {
    if !record.holes.is_empty() {
        return Err(GeometryViolation::InteriorRings {
            count: record.holes.len(),
        });
    }
    validate_ring(&record.boundary)?;
    bounding_box_of(record.boundary.iter().copied())
        .ok_or(GeometryViolation::TooFewVertices { count: 0 })
}

/// All points of interest of one snapshot.
#[derive(Debug, Default)]
pub struct PointStore {
    points: Vec<Arc<PointOfInterest>>,
    by_id: HashMap<String, usize>,
    bbox: Option<BoundingBox>,
}

impl PointStore {
    /// Validate and load point records. Accepted points keep input order.
    pub fn load(records: Vec<PointRecord>) -> StoreLoad<Self, PointRecord> {
        let mut store = PointStore::default();
        let mut rejected = Vec::new();

        for record in records {
            if let Err(violation) = validate_location(record.location) {
                warn!("Rejected point of interest '{}': {}", record.id, violation);
                let id = record.id.clone();
                rejected.push((record, FenceError::InvalidGeometry { id, violation }));
                continue;
            }

            if store.by_id.contains_key(&record.id) {
                warn!("Rejected point of interest '{}': duplicate id", record.id);
                let id = record.id.clone();
                rejected.push((record, FenceError::DuplicateId(id)));
                continue;
            }

            let point_box = BoundingBox::from_coordinate(record.location);
            store.bbox = Some(match store.bbox {
                Some(total) => total.union(&point_box),
                None => point_box,
            });
            store.by_id.insert(record.id.clone(), store.points.len());
            store.points.push(Arc::new(PointOfInterest::from(record)));
        }

        info!(
            "Loaded {} points of interest ({} rejected)",
            store.points.len(),
            rejected.len()
        );

        StoreLoad { store, rejected }
    }

    pub fn all(&self) -> &[Arc<PointOfInterest>] {
        &self.points
    }

    pub fn get(&self, position: usize) -> Option<&Arc<PointOfInterest>> {
        self.points.get(position)
    }

    pub fn by_id(&self, id: &str) -> Result<&Arc<PointOfInterest>> {
        self.by_id
            .get(id)
            .map(|&position| &self.points[position])
            .ok_or_else(|| FenceError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn square(id: &str, key: i64, origin: f64) -> RegionRecord {
        let ring = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]
            .iter()
            .map(|&(lon, lat)| Coordinate::new(lon + origin, lat + origin))
            .collect();
        RegionRecord::new(id, key, id, ring)
    }

    #[test]
    fn test_bad_record_does_not_abort_load() {
        let mut records: Vec<RegionRecord> = (0..9)
            .map(|i| square(&format!("r{i}"), i, i as f64 * 2.0))
            .collect();
        let triangle_open = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(0.0, 0.0),
        ];
        records.insert(4, RegionRecord::new("bad", 100, "bad", triangle_open));

        let loaded = RegionStore::load(records);
        assert_eq!(loaded.store.len(), 9);
        assert_eq!(loaded.rejected.len(), 1);
        let (record, reason) = &loaded.rejected[0];
        assert_eq!(record.id, "bad");
        assert!(matches!(
            reason,
            FenceError::InvalidGeometry {
                violation: GeometryViolation::TooFewVertices { count: 3 },
                ..
            }
        ));
        // input order survives the parallel validation
        let ids: Vec<&str> = loaded.store.all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8"]);
    }

    #[test]
    fn test_lookup_by_id_and_key() {
        let loaded = RegionStore::load(vec![
            square("a", 42, 0.0),
            square("b", 7, 5.0),
            square("c", 42, 10.0),
        ]);
        let store = loaded.store;

        assert_eq!(store.by_id("b").unwrap().location_key, 7);
        assert_eq!(
            store.by_id("zzz").unwrap_err(),
            FenceError::NotFound("zzz".into())
        );

        let shared: Vec<&str> = store
            .by_location_key(42)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(shared, ["a", "c"]);
        assert!(store.by_location_key(99).is_empty());
        assert_eq!(store.bbox(), Some(BoundingBox::new(0.0, 0.0, 11.0, 11.0)));
    }

    #[test]
    fn test_duplicate_and_holed_regions_rejected() {
        let mut holed = square("holed", 3, 20.0);
        holed.holes.push(vec![Coordinate::new(20.2, 20.2)]);

        let loaded = RegionStore::load(vec![square("a", 1, 0.0), square("a", 2, 5.0), holed]);
        assert_eq!(loaded.store.len(), 1);
        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(loaded.rejected[0].1, FenceError::DuplicateId("a".into()));
        assert!(matches!(
            loaded.rejected[1].1,
            FenceError::InvalidGeometry {
                violation: GeometryViolation::InteriorRings { count: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_point_store_load() {
        let loaded = PointStore::load(vec![
            PointRecord::new("p1", "The Anchor", "pub", Coordinate::new(5.0, 5.0)),
            PointRecord::new("p2", "Nowhere", "pub", Coordinate::new(f64::NAN, 5.0)),
            PointRecord::new("p1", "Again", "pub", Coordinate::new(6.0, 6.0)),
            PointRecord::new("p3", "Hill", "viewpoint", Coordinate::new(-1.0, 2.0)),
        ]);
        assert_eq!(loaded.store.len(), 2);
        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(loaded.store.by_id("p3").unwrap().category, "viewpoint");
        assert_eq!(
            loaded.store.bbox(),
            Some(BoundingBox::new(-1.0, 2.0, 5.0, 5.0))
        );
    }

    #[test]
    fn test_empty_stores() {
        let regions = RegionStore::load(Vec::new()).store;
        let points = PointStore::load(Vec::new()).store;
        assert!(regions.is_empty());
        assert!(points.is_empty());
        assert!(regions.bbox().is_none());
        assert!(points.bbox().is_none());
    }
}

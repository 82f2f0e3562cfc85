//! Containment queries composed from the spatial index and the geometry kernel.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::geometry::point_in_ring;
use super::index::SpatialIndex;
use super::store::{PointStore, RegionStore};
use crate::error::{FenceError, Result};
use crate::models::{Coordinate, PointOfInterest, Region};

/// Points found for a location key, with the regions that key resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct LocationPoints {
    pub location_key: i64,
    pub regions: Vec<Arc<Region>>,
    pub points: Vec<Arc<PointOfInterest>>,
}

impl LocationPoints {
    /// More than one region shares the key; `points` is their union.
    pub fn is_ambiguous(&self) -> bool {
        self.regions.len() > 1
    }
}

/// Borrowing view over one snapshot's stores and index.
#[derive(Clone, Copy)]
pub struct ContainmentResolver<'a> {
    regions: &'a RegionStore,
    points: &'a PointStore,
    index: &'a SpatialIndex,
}

impl<'a> ContainmentResolver<'a> {
    pub fn new(regions: &'a RegionStore, points: &'a PointStore, index: &'a SpatialIndex) -> Self {
        Self {
            regions,
            points,
            index,
        }
    }

    /// Every region whose boundary contains `point`, edges included.
    ///
    /// Overlapping regions are all returned. Order follows the store.
    pub fn regions_containing(&self, point: Coordinate) -> Vec<Arc<Region>> {
        let mut candidates = self.index.candidates_for(point);
        candidates.sort_unstable();

        let matches: Vec<Arc<Region>> = candidates
            .iter()
            .filter_map(|&position| self.regions.get(position))
            .filter(|region| region.bbox.contains(point))
            .filter(|region| point_in_ring(point, &region.boundary).is_contained())
            .cloned()
            .collect();

        debug!(
            "Containment at ({}, {}): {} candidates, {} regions",
            point.lon,
            point.lat,
            candidates.len(),
            matches.len()
        );

        matches
    }

    /// Every point of interest inside or on the boundary of `region`.
    pub fn points_within(&self, region: &Region) -> Vec<Arc<PointOfInterest>> {
        self.point_positions_within(region)
            .into_iter()
            .filter_map(|position| self.points.get(position).cloned())
            .collect()
    }

    /// Points for every region carrying `key`.
    ///
    /// A key shared by several regions yields the deduplicated union of their
    /// points; [`LocationPoints::is_ambiguous`] reports that case.
    pub fn points_for_location_key(&self, key: i64) -> Result<LocationPoints> {
        let regions = self.regions.by_location_key(key);
        if regions.is_empty() {
            return Err(FenceError::NoSuchLocation(key));
        }

        let mut positions: Vec<usize> = regions
            .iter()
            .flat_map(|region| self.point_positions_within(region))
            .collect();
        positions.sort_unstable();
        positions.dedup();

        let points: Vec<Arc<PointOfInterest>> = positions
            .into_iter()
            .filter_map(|position| self.points.get(position).cloned())
            .collect();

        debug!(
            "Location key {}: {} region(s), {} points",
            key,
            regions.len(),
            points.len()
        );

        Ok(LocationPoints {
            location_key: key,
            regions: regions.into_iter().cloned().collect(),
            points,
        })
    }

    fn point_positions_within(&self, region: &Region) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .index
            .points_in_box(&region.bbox)
            .into_iter()
            .filter(|&position| {
                self.points.get(position).is_some_and(|poi| {
                    point_in_ring(poi.location, &region.boundary).is_contained()
                })
            })
            .collect();
        positions.sort_unstable();
        positions
    }
}

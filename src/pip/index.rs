//! Spatial pre-filter over the region and point stores.
//!
//! Regions go into a uniform grid: each region is registered in every cell
//! its bounding box overlaps, so the cell holding a query point lists every
//! region that could contain it. Points of interest go into an R-tree keyed
//! by location. Both structures hold store positions only.

use std::fmt;

use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::store::{PointStore, RegionStore};
use crate::models::{BoundingBox, Coordinate};

const FALLBACK_CELL_SIZE: f64 = 1.0;

/// 2^53: cell indices at or past this are not exact integers in `f64`.
const MAX_EXACT_CELL: f64 = 9_007_199_254_740_992.0;

/// Grid tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Cell edge in degrees. Defaults to the median region extent.
    #[serde(default)]
    pub cell_size: Option<f64>,

    /// Regions spanning more cells than this are kept on a list that every
    /// lookup returns, instead of being registered cell by cell.
    #[serde(default = "default_max_cells_per_region")]
    pub max_cells_per_region: u64,
}

fn default_max_cells_per_region() -> u64 {
    4096
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size: None,
            max_cells_per_region: default_max_cells_per_region(),
        }
    }
}

type CellKey = (i64, i64);

/// Uniform grid of region positions.
#[derive(Debug)]
struct RegionGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    oversized: Vec<usize>,
}

impl RegionGrid {
    fn build(regions: &RegionStore, config: &IndexConfig) -> Self {
        let cell_size = resolve_cell_size(regions, config);
        let mut grid = RegionGrid {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        };

        for (position, region) in regions.all().iter().enumerate() {
            let Some(((x0, y0), (x1, y1))) = grid.cell_range(&region.bbox, config) else {
                grid.oversized.push(position);
                continue;
            };

            for x in x0..=x1 {
                for y in y0..=y1 {
                    grid.cells.entry((x, y)).or_default().push(position);
                }
            }
        }

        grid
    }

    /// Corner cells of `bbox`, or `None` when it spans more than
    /// `max_cells_per_region` cells or its cell indices leave the range an
    /// `f64` holds exactly.
    fn cell_range(
        &self,
        bbox: &BoundingBox,
        config: &IndexConfig,
    ) -> Option<(CellKey, CellKey)> {
        let x0 = (bbox.min_lon / self.cell_size).floor();
        let y0 = (bbox.min_lat / self.cell_size).floor();
        let x1 = (bbox.max_lon / self.cell_size).floor();
        let y1 = (bbox.max_lat / self.cell_size).floor();

        if [x0, y0, x1, y1].iter().any(|v| !(v.abs() < MAX_EXACT_CELL)) {
            return None;
        }

        let span = (x1 - x0 + 1.0) * (y1 - y0 + 1.0);
        if span > config.max_cells_per_region as f64 {
            return None;
        }

        Some(((x0 as i64, y0 as i64), (x1 as i64, y1 as i64)))
    }

    /// Cell holding (`lon`, `lat`). Saturates instead of wrapping; no
    /// registered cell lies outside `MAX_EXACT_CELL`.
    fn cell_of(&self, lon: f64, lat: f64) -> CellKey {
        (
            (lon / self.cell_size).floor() as i64,
            (lat / self.cell_size).floor() as i64,
        )
    }

    fn candidates(&self, point: Coordinate) -> Vec<usize> {
        let mut out = self.oversized.clone();
        if let Some(positions) = self.cells.get(&self.cell_of(point.lon, point.lat)) {
            out.extend_from_slice(positions);
        }
        out
    }
}

fn resolve_cell_size(regions: &RegionStore, config: &IndexConfig) -> f64 {
    if let Some(size) = config.cell_size {
        if size.is_finite() && size > 0.0 {
            return size;
        }
        warn!(
            "Ignoring cell size {}; falling back to median region extent",
            size
        );
    }

    let mut extents: Vec<f64> = regions
        .all()
        .iter()
        .map(|r| r.bbox.width().max(r.bbox.height()))
        .filter(|extent| *extent > 0.0)
        .collect();

    if extents.is_empty() {
        return FALLBACK_CELL_SIZE;
    }

    extents.sort_by(|a, b| a.total_cmp(b));
    extents[extents.len() / 2]
}

/// R-tree entry for a point of interest
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    position: usize,
    location: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.location)
    }
}

/// Combined pre-filter for one snapshot.
pub struct SpatialIndex {
    regions: RegionGrid,
    points: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Build both indexes from freshly loaded stores.
    pub fn build(regions: &RegionStore, points: &PointStore, config: &IndexConfig) -> Self {
        info!(
            "Building spatial index for {} regions and {} points...",
            regions.len(),
            points.len()
        );

        let grid = RegionGrid::build(regions, config);

        let indexed: Vec<IndexedPoint> = points
            .all()
            .iter()
            .enumerate()
            .map(|(position, poi)| IndexedPoint {
                position,
                location: [poi.location.lon, poi.location.lat],
            })
            .collect();
        let tree = RTree::bulk_load(indexed);

        info!(
            "Spatial index built: cell size {:.4}, {} cells, {} oversized regions, {} points",
            grid.cell_size,
            grid.cells.len(),
            grid.oversized.len(),
            tree.size()
        );

        Self {
            regions: grid,
            points: tree,
        }
    }

    /// Region positions that may contain `point`. Never misses a containing
    /// region; may include regions that do not contain it.
    pub fn candidates_for(&self, point: Coordinate) -> Vec<usize> {
        self.regions.candidates(point)
    }

    /// Positions of every point of interest inside `bbox`, edges included.
    pub fn points_in_box(&self, bbox: &BoundingBox) -> Vec<usize> {
        self.points
            .locate_in_envelope_intersecting(&bbox.to_envelope())
            .map(|p| p.position)
            .collect()
    }

    pub fn cell_size(&self) -> f64 {
        self.regions.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.regions.cells.len()
    }

    pub fn oversized_count(&self) -> usize {
        self.regions.oversized.len()
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("cell_size", &self.regions.cell_size)
            .field("cells", &self.regions.cells.len())
            .field("oversized", &self.regions.oversized.len())
            .field("points", &self.points.size())
            .finish()
    }
}

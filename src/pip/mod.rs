//! Point-in-polygon (PIP) containment core.
//!
//! Validated stores, a grid/R-tree pre-filter and ray-casting containment,
//! published as versioned snapshots behind [`QueryService`].

mod geometry;
mod index;
mod resolver;
mod service;
mod snapshot;
mod store;

pub use geometry::{bounding_box_of, point_in_ring, validate_location, validate_ring, Containment};
pub use index::{IndexConfig, SpatialIndex};
pub use resolver::{ContainmentResolver, LocationPoints};
pub use service::{validate_coordinate, Accepted, Health, LoadReport, QueryService, RejectedRecord};
pub use snapshot::{Snapshot, SnapshotCell};
pub use store::{PointStore, RegionStore, StoreLoad};

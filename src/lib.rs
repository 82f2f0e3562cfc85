//! Fenceline - point-in-fence and points-of-interest lookup.
//!
//! This library provides the containment core used by the query binary:
//! validated region and point stores, a spatial pre-filter, ray-casting
//! containment and a snapshot-swapping query service.

pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod params;
pub mod pip;

pub use error::{FenceError, GeometryViolation, Result};
pub use models::{BoundingBox, Coordinate, PointOfInterest, Region};
pub use pip::{QueryService, SnapshotCell};

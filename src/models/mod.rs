//! Core data models for regions and points of interest.

pub mod coord;
pub mod poi;
pub mod region;

pub use coord::{BoundingBox, Coordinate};
pub use poi::{PointOfInterest, PointRecord};
pub use region::{Region, RegionRecord};

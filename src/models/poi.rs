//! Point of interest types.

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;

/// A point of interest record as handed to the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: String,
    pub name: String,
    /// Free-text tag (e.g. "pub", "viewpoint")
    pub category: String,
    pub location: Coordinate,
}

impl PointRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        location: Coordinate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            location,
        }
    }
}

/// A validated point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub location: Coordinate,
}

impl From<PointRecord> for PointOfInterest {
    fn from(record: PointRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            category: record.category,
            location: record.location,
        }
    }
}

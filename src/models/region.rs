//! Region ("fence") types.

use serde::{Deserialize, Serialize};

use super::coord::{BoundingBox, Coordinate};

/// A region record as handed to the loader, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Opaque identifier
    pub id: String,

    /// Location key; expected unique, not enforced
    pub location_key: i64,

    pub name: String,

    /// Closed outer ring, longitude-first
    pub boundary: Vec<Coordinate>,

    /// Interior rings carried over from the feed. Any entry here rejects the record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Coordinate>>,
}

impl RegionRecord {
    pub fn new(
        id: impl Into<String>,
        location_key: i64,
        name: impl Into<String>,
        boundary: Vec<Coordinate>,
    ) -> Self {
        Self {
            id: id.into(),
            location_key,
            name: name.into(),
            boundary,
            holes: Vec::new(),
        }
    }
}

/// A validated region with its cached bounding box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub id: String,
    pub location_key: i64,
    pub name: String,
    pub boundary: Vec<Coordinate>,
    pub bbox: BoundingBox,
}

impl Region {
    /// Built only by [`crate::pip::RegionStore::load`] once the ring has been validated.
    pub(crate) fn from_validated(record: RegionRecord, bbox: BoundingBox) -> Self {
        Self {
            id: record.id,
            location_key: record.location_key,
            name: record.name,
            boundary: record.boundary,
            bbox,
        }
    }
}

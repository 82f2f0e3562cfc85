//! GeoJSON-like response shaping.
//!
//! Output positions are `[lon, lat]`, the same order the feeds use.

use serde::Serialize;
use serde_json::{json, Value};

use fenceline::models::{Coordinate, PointOfInterest, Region};
use fenceline::pip::LocationPoints;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub geometry: Geometry,
    pub properties: Value,
}

fn position(c: Coordinate) -> [f64; 2] {
    [c.lon, c.lat]
}

pub fn region_feature(region: &Region) -> Feature {
    Feature {
        feature_type: "Feature",
        geometry: Geometry::Polygon {
            coordinates: vec![region.boundary.iter().copied().map(position).collect()],
        },
        properties: json!({
            "id": region.id,
            "location_id": region.location_key,
            "name": region.name,
        }),
    }
}

pub fn point_feature(poi: &PointOfInterest) -> Feature {
    Feature {
        feature_type: "Feature",
        geometry: Geometry::Point {
            coordinates: position(poi.location),
        },
        properties: json!({
            "id": poi.id,
            "name": poi.name,
            "category": poi.category,
        }),
    }
}

/// Points for a location key, flagging keys shared by several regions.
pub fn location_points_body(found: &LocationPoints) -> Value {
    json!({
        "location_id": found.location_key,
        "ambiguous": found.is_ambiguous(),
        "regions": found.regions.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        "features": found.points.iter().map(|p| point_feature(p)).collect::<Vec<_>>(),
    })
}

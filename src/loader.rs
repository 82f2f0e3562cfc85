//! Reads region and point-of-interest feeds from JSON files.
//!
//! The feeds are arrays of documents in the shape the administrative export
//! produces: GeoJSON geometries with `[lon, lat]` positions and Mongo-style
//! `_id` fields. This is the only place positional coordinates are accepted;
//! they are converted to [`Coordinate`] immediately.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::models::{Coordinate, PointRecord, RegionRecord};

/// `_id` as either a plain string or extended JSON `{"$oid": "..."}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentId {
    Plain(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl DocumentId {
    fn into_string(self) -> String {
        match self {
            DocumentId::Plain(s) => s,
            DocumentId::ObjectId { oid } => oid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoJsonPolygon {
    #[serde(rename = "type")]
    geo_type: String,
    coordinates: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    geo_type: String,
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FenceDocument {
    #[serde(rename = "_id")]
    id: DocumentId,
    #[serde(rename = "LocationId")]
    location_id: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Polygon")]
    polygon: GeoJsonPolygon,
}

#[derive(Debug, Deserialize)]
struct PointDocument {
    #[serde(rename = "_id")]
    id: DocumentId,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Location")]
    location: GeoJsonPoint,
}

fn to_coordinate(position: &[f64]) -> Result<Coordinate> {
    match position {
        [lon, lat, ..] => Ok(Coordinate::new(*lon, *lat)),
        _ => bail!("GeoJSON position needs at least 2 numbers, got {}", position.len()),
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Result<Vec<Coordinate>> {
    positions.iter().map(|p| to_coordinate(p)).collect()
}

impl FenceDocument {
    fn into_record(self) -> Result<RegionRecord> {
        let id = self.id.into_string();
        if self.polygon.geo_type != "Polygon" {
            bail!(
                "region '{}' has geometry type '{}', expected 'Polygon'",
                id,
                self.polygon.geo_type
            );
        }

        let mut rings = self
            .polygon
            .coordinates
            .iter()
            .map(|ring| to_ring(ring))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("region '{}'", id))?
            .into_iter();

        let boundary = rings.next().unwrap_or_default();
        Ok(RegionRecord {
            id,
            location_key: self.location_id,
            name: self.name,
            boundary,
            holes: rings.collect(),
        })
    }
}

impl PointDocument {
    fn into_record(self) -> Result<PointRecord> {
        let id = self.id.into_string();
        if self.location.geo_type != "Point" {
            bail!(
                "point of interest '{}' has geometry type '{}', expected 'Point'",
                id,
                self.location.geo_type
            );
        }
        let location =
            to_coordinate(&self.location.coordinates).with_context(|| format!("point '{}'", id))?;
        Ok(PointRecord {
            id,
            name: self.name,
            category: self.category,
            location,
        })
    }
}

/// Parse a region feed.
pub fn parse_regions(json: &str) -> Result<Vec<RegionRecord>> {
    let docs: Vec<FenceDocument> =
        serde_json::from_str(json).context("Failed to parse region feed")?;
    docs.into_iter().map(FenceDocument::into_record).collect()
}

/// Parse a point-of-interest feed.
pub fn parse_points(json: &str) -> Result<Vec<PointRecord>> {
    let docs: Vec<PointDocument> =
        serde_json::from_str(json).context("Failed to parse point of interest feed")?;
    docs.into_iter().map(PointDocument::into_record).collect()
}

pub fn read_regions<P: AsRef<Path>>(path: P) -> Result<Vec<RegionRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read region feed {}", path.display()))?;
    let records = parse_regions(&content)?;
    info!("Read {} region records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_points<P: AsRef<Path>>(path: P) -> Result<Vec<PointRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read point of interest feed {}", path.display()))?;
    let records = parse_points(&content)?;
    info!(
        "Read {} point of interest records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

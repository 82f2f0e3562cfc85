//! Planar geometry kernel: point-in-ring classification, bounding boxes and
//! ring validation.
//!
//! Coordinates are treated as planar (no geodesic correction). Regions are
//! sub-national in scale, so the error is well below the precision of the
//! boundaries themselves.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::Line;
use serde::Serialize;

use crate::error::GeometryViolation;
use crate::models::{BoundingBox, Coordinate};

/// Where a point lies relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    Inside,
    Outside,
    OnBoundary,
}

impl Containment {
    /// Inside or on the boundary.
    pub fn is_contained(&self) -> bool {
        !matches!(self, Containment::Outside)
    }
}

/// Classify `point` against a closed ring by ray casting in +lon.
///
/// An edge crosses the ray only when exactly one of its endpoints lies
/// strictly below the ray's latitude. Horizontal edges never cross and a ray
/// passing through a vertex is counted once. Each edge is evaluated with its
/// endpoints in canonical order, so reversing the ring cannot change the
/// result.
pub fn point_in_ring(point: Coordinate, ring: &[Coordinate]) -> Containment {
    let mut inside = false;

    for edge in ring.windows(2) {
        let (a, b) = canonical(edge[0], edge[1]);

        if on_segment(point, a, b) {
            return Containment::OnBoundary;
        }

        if (a.lat < point.lat) != (b.lat < point.lat) {
            let t = (point.lat - a.lat) / (b.lat - a.lat);
            let crossing_lon = a.lon + t * (b.lon - a.lon);
            if crossing_lon > point.lon {
                inside = !inside;
            }
        }
    }

    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Order an edge's endpoints by (lat, lon).
fn canonical(a: Coordinate, b: Coordinate) -> (Coordinate, Coordinate) {
    if a.lat < b.lat || (a.lat == b.lat && a.lon <= b.lon) {
        (a, b)
    } else {
        (b, a)
    }
}

fn on_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> bool {
    if p.lon < a.lon.min(b.lon)
        || p.lon > a.lon.max(b.lon)
        || p.lat < a.lat.min(b.lat)
        || p.lat > a.lat.max(b.lat)
    {
        return false;
    }
    let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
    cross == 0.0
}

/// Bounding box of a ring or point set. `None` for an empty input.
pub fn bounding_box_of<I>(coords: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = Coordinate>,
{
    coords.into_iter().fold(None, |acc, c| {
        Some(match acc {
            None => BoundingBox::from_coordinate(c),
            Some(bbox) => BoundingBox::new(
                bbox.min_lon.min(c.lon),
                bbox.min_lat.min(c.lat),
                bbox.max_lon.max(c.lon),
                bbox.max_lat.max(c.lat),
            ),
        })
    })
}

/// Check that a point location is usable.
pub fn validate_location(location: Coordinate) -> Result<(), GeometryViolation> {
    if !location.is_finite() {
        return Err(GeometryViolation::NonFinite { index: 0 });
    }
    if !location.in_range() {
        return Err(GeometryViolation::OutOfRange { index: 0 });
    }
    Ok(())
}

/// Check that `ring` is a simple closed ring with at least 4 vertices.
pub fn validate_ring(ring: &[Coordinate]) -> Result<(), GeometryViolation> {
    for (index, c) in ring.iter().enumerate() {
        if !c.is_finite() {
            return Err(GeometryViolation::NonFinite { index });
        }
        if !c.in_range() {
            return Err(GeometryViolation::OutOfRange { index });
        }
    }

    if ring.len() < 4 {
        return Err(GeometryViolation::TooFewVertices { count: ring.len() });
    }

    if ring.first() != ring.last() {
        return Err(GeometryViolation::NotClosed);
    }

    if let Some(index) = ring.windows(2).position(|w| w[0] == w[1]) {
        return Err(GeometryViolation::DegenerateEdge { index });
    }

    if let Some((first, second)) = find_self_intersection(ring) {
        return Err(GeometryViolation::SelfIntersecting { first, second });
    }

    Ok(())
}

/// Sweep over edges sorted by their western end, testing each edge only
/// against the edges whose longitude span is still open.
fn find_self_intersection(ring: &[Coordinate]) -> Option<(usize, usize)> {
    let lines: Vec<Line<f64>> = ring.windows(2).map(|w| Line::new(w[0], w[1])).collect();
    let edge_count = lines.len();

    let west = |l: &Line<f64>| l.start.x.min(l.end.x);
    let east = |l: &Line<f64>| l.start.x.max(l.end.x);

    let mut order: Vec<usize> = (0..edge_count).collect();
    order.sort_by(|&a, &b| west(&lines[a]).total_cmp(&west(&lines[b])));

    let mut active: Vec<usize> = Vec::new();
    for &i in &order {
        let sweep_lon = west(&lines[i]);
        active.retain(|&j| east(&lines[j]) >= sweep_lon);

        for &j in &active {
            let Some(hit) = line_intersection(lines[i], lines[j]) else {
                continue;
            };
            let allowed = is_adjacent(i, j, edge_count)
                && matches!(hit, LineIntersection::SinglePoint { is_proper: false, .. });
            if !allowed {
                return Some((i.min(j), i.max(j)));
            }
        }

        active.push(i);
    }

    None
}

/// Consecutive edges (including last/first) share exactly one vertex.
fn is_adjacent(i: usize, j: usize, edge_count: usize) -> bool {
    let (lo, hi) = (i.min(j), i.max(j));
    hi - lo == 1 || (lo == 0 && hi == edge_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(lon, lat)| Coordinate::new(lon, lat)).collect()
    }

    fn square() -> Vec<Coordinate> {
        ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)])
    }

    #[test]
    fn test_square_inside_outside() {
        let sq = square();
        assert_eq!(point_in_ring(Coordinate::new(5.0, 5.0), &sq), Containment::Inside);
        assert_eq!(point_in_ring(Coordinate::new(15.0, 15.0), &sq), Containment::Outside);
        assert_eq!(point_in_ring(Coordinate::new(-0.1, 5.0), &sq), Containment::Outside);
    }

    #[test]
    fn test_boundary_points() {
        let sq = square();
        for p in [(0.0, 5.0), (10.0, 10.0), (5.0, 0.0), (10.0, 3.0), (0.0, 0.0)] {
            assert_eq!(
                point_in_ring(Coordinate::new(p.0, p.1), &sq),
                Containment::OnBoundary,
                "{:?}",
                p
            );
        }
    }

    #[test]
    fn test_reversed_ring_same_classification() {
        let sq = square();
        let mut rev = sq.clone();
        rev.reverse();
        for p in [(5.0, 5.0), (0.0, 5.0), (10.0, 10.0), (12.0, 5.0), (5.0, 10.0)] {
            let c = Coordinate::new(p.0, p.1);
            assert_eq!(point_in_ring(c, &sq), point_in_ring(c, &rev));
        }
    }

    #[test]
    fn test_ray_through_vertex_counted_once() {
        let diamond = ring(&[(0.0, 5.0), (5.0, 10.0), (10.0, 5.0), (5.0, 0.0), (0.0, 5.0)]);
        assert_eq!(point_in_ring(Coordinate::new(2.0, 5.0), &diamond), Containment::Inside);
        assert_eq!(point_in_ring(Coordinate::new(-2.0, 5.0), &diamond), Containment::Outside);
        assert_eq!(point_in_ring(Coordinate::new(11.0, 5.0), &diamond), Containment::Outside);
    }

    #[test]
    fn test_horizontal_edge_on_ray() {
        // U shape whose top edges lie on the ray
        let u = ring(&[
            (0.0, 0.0),
            (6.0, 0.0),
            (6.0, 4.0),
            (4.0, 4.0),
            (4.0, 2.0),
            (2.0, 2.0),
            (2.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
        ]);
        assert_eq!(point_in_ring(Coordinate::new(1.0, 3.0), &u), Containment::Inside);
        assert_eq!(point_in_ring(Coordinate::new(3.0, 3.0), &u), Containment::Outside);
        assert_eq!(point_in_ring(Coordinate::new(-1.0, 4.0), &u), Containment::Outside);
        assert_eq!(point_in_ring(Coordinate::new(3.0, 2.0), &u), Containment::OnBoundary);
    }

    #[test]
    fn test_shared_edge_is_boundary_for_both() {
        let west = square();
        let east = ring(&[(10.0, 0.0), (10.0, 10.0), (20.0, 10.0), (20.0, 0.0), (10.0, 0.0)]);
        let p = Coordinate::new(10.0, 4.0);
        assert_eq!(point_in_ring(p, &west), Containment::OnBoundary);
        assert_eq!(point_in_ring(p, &east), Containment::OnBoundary);

        let q = Coordinate::new(10.5, 4.0);
        assert_eq!(point_in_ring(q, &west), Containment::Outside);
        assert_eq!(point_in_ring(q, &east), Containment::Inside);
    }

    #[test]
    fn test_bounding_box_of() {
        let bbox = bounding_box_of(square()).unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(bounding_box_of(Vec::new()).is_none());
    }

    #[test]
    fn test_validate_accepts_simple_rings() {
        assert!(validate_ring(&square()).is_ok());
        let triangle = ring(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0), (0.0, 0.0)]);
        assert!(validate_ring(&triangle).is_ok());
    }

    #[test]
    fn test_validate_too_few_vertices() {
        let r = ring(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(
            validate_ring(&r),
            Err(GeometryViolation::TooFewVertices { count: 3 })
        );
    }

    #[test]
    fn test_validate_not_closed() {
        let r = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert_eq!(validate_ring(&r), Err(GeometryViolation::NotClosed));
    }

    #[test]
    fn test_validate_bow_tie() {
        let r = ring(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]);
        assert!(matches!(
            validate_ring(&r),
            Err(GeometryViolation::SelfIntersecting { .. })
        ));
    }

    #[test]
    fn test_validate_collinear_spike() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        assert!(matches!(
            validate_ring(&r),
            Err(GeometryViolation::SelfIntersecting { .. })
        ));
    }

    #[test]
    fn test_validate_degenerate_and_non_finite() {
        let dup = ring(&[(0.0, 0.0), (0.0, 1.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(
            validate_ring(&dup),
            Err(GeometryViolation::DegenerateEdge { index: 1 })
        );

        let nan = ring(&[(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&nan), Err(GeometryViolation::NonFinite { index: 1 }));

        let far = ring(&[(0.0, 0.0), (0.0, 95.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&far), Err(GeometryViolation::OutOfRange { index: 1 }));
    }

    #[test]
    fn test_validate_location() {
        assert!(validate_location(Coordinate::new(-3.01, 51.07)).is_ok());
        assert!(validate_location(Coordinate::new(f64::INFINITY, 0.0)).is_err());
        assert!(validate_location(Coordinate::new(200.0, 0.0)).is_err());
    }
}

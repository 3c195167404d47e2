//! Spatial index over the settlement habitat polygons
//!
//! Built once from an ordered collection of closed-ring polygons and
//! immutable afterwards: the fused union geometry answers containment
//! queries, the centroid table (radians) answers nearest-habitat queries.
//! Shared between the orientation and boundary components via `Arc` rather
//! than any process-wide state.

use crate::core::error::{DriftError, Result};
use crate::spatial::sphere::haversine_km_rad;
use geo::{BooleanOps, Centroid, Contains};
use geo_types::{LineString, MultiPolygon, Point, Polygon};

pub struct HabitatIndex {
    /// Union of all habitat polygons, for point-in-habitat tests
    fused: MultiPolygon<f64>,
    /// Per-polygon centroid, degrees (lon, lat), indexed by habitat id
    centroids_deg: Vec<(f64, f64)>,
    /// Same centroids in radians, the unit the nearest query works in
    centroids_rad: Vec<(f64, f64)>,
}

impl HabitatIndex {
    /// Build the index. Polygon order defines habitat ids. An empty set is
    /// permitted (containment is then always false) but nearest queries on
    /// it fail, and orientation modes that need habitat reject it up front.
    pub fn new(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        let mut centroids_deg = Vec::with_capacity(polygons.len());
        for (i, poly) in polygons.iter().enumerate() {
            let c = poly.centroid().ok_or_else(|| {
                DriftError::option("habitat_polygons", format!("polygon {i} has no centroid"))
            })?;
            centroids_deg.push((c.x(), c.y()));
        }
        let centroids_rad = centroids_deg
            .iter()
            .map(|&(lon, lat)| (lon.to_radians(), lat.to_radians()))
            .collect();

        // Equivalent of fusing with a zero-width buffer: union everything
        // into one clean multi-polygon.
        let fused = match polygons.split_first() {
            None => MultiPolygon::new(Vec::new()),
            Some((first, rest)) => {
                let mut fused = MultiPolygon::new(vec![first.clone()]);
                for poly in rest {
                    fused = fused.union(&MultiPolygon::new(vec![poly.clone()]));
                }
                fused
            }
        };

        Ok(Self {
            fused,
            centroids_deg,
            centroids_rad,
        })
    }

    /// Build from closed exterior rings in geographic coordinates, the shape
    /// the habitat polygon source delivers.
    pub fn from_rings(rings: &[Vec<(f64, f64)>]) -> Result<Self> {
        let polygons = rings
            .iter()
            .map(|ring| Polygon::new(LineString::from(ring.clone()), Vec::new()))
            .collect();
        Self::new(polygons)
    }

    pub fn len(&self) -> usize {
        self.centroids_rad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids_rad.is_empty()
    }

    /// Great-circle distance (km) and id of the closest habitat centroid.
    /// Empty habitat is a configuration error, never a sentinel distance.
    pub fn nearest(&self, lon: f64, lat: f64) -> Result<(f64, usize)> {
        if self.is_empty() {
            return Err(DriftError::EmptyHabitat {
                context: "nearest-habitat query on an empty index",
            });
        }
        let (qlon, qlat) = (lon.to_radians(), lat.to_radians());
        let mut best = (f64::INFINITY, 0);
        for (id, &(clon, clat)) in self.centroids_rad.iter().enumerate() {
            let d = haversine_km_rad(qlon, qlat, clon, clat);
            if d < best.0 {
                best = (d, id);
            }
        }
        Ok(best)
    }

    /// Centroid of a habitat polygon, degrees (lon, lat)
    pub fn centroid_deg(&self, id: usize) -> (f64, f64) {
        self.centroids_deg[id]
    }

    /// Point-in-habitat test against the fused geometry. Boundary points
    /// follow the underlying predicate (exterior ring excluded); false for
    /// an empty habitat set.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.fused.contains(&Point::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::sphere::haversine_km;

    fn square(lon0: f64, lat0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![
            (lon0, lat0),
            (lon0 + size, lat0),
            (lon0 + size, lat0 + size),
            (lon0, lat0 + size),
            (lon0, lat0),
        ]
    }

    #[test]
    fn test_single_polygon_nearest() {
        let index = HabitatIndex::from_rings(&[square(170.0, -40.0, 0.2)]).unwrap();
        assert_eq!(index.len(), 1);

        let (dist, id) = index.nearest(170.5, -40.5).unwrap();
        assert_eq!(id, 0);

        // Distance equals the haversine distance to the centroid
        let (clon, clat) = index.centroid_deg(0);
        let expected = haversine_km(170.5, -40.5, clon, clat);
        assert!((dist - expected).abs() < 1e-9);

        // Symmetric under swapping query and target
        let back = haversine_km(clon, clat, 170.5, -40.5);
        assert!((dist - back).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_picks_closest_of_two() {
        let index =
            HabitatIndex::from_rings(&[square(170.0, -40.0, 0.2), square(175.0, -40.0, 0.2)])
                .unwrap();
        let (_, id) = index.nearest(175.2, -40.1).unwrap();
        assert_eq!(id, 1);
        let (_, id) = index.nearest(169.8, -40.1).unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_contains_is_idempotent() {
        let index = HabitatIndex::from_rings(&[square(170.0, -40.0, 0.2)]).unwrap();
        let inside = (170.1, -39.9);
        let outside = (171.0, -39.0);
        assert!(index.contains(inside.0, inside.1));
        assert_eq!(
            index.contains(inside.0, inside.1),
            index.contains(inside.0, inside.1)
        );
        assert!(!index.contains(outside.0, outside.1));
    }

    #[test]
    fn test_overlapping_polygons_fuse() {
        let index =
            HabitatIndex::from_rings(&[square(170.0, -40.0, 0.2), square(170.1, -40.0, 0.2)])
                .unwrap();
        // Point inside the overlap region is contained exactly once
        assert!(index.contains(170.15, -39.9));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_habitat() {
        let index = HabitatIndex::new(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(!index.contains(0.0, 0.0));
        assert!(matches!(
            index.nearest(0.0, 0.0),
            Err(DriftError::EmptyHabitat { .. })
        ));
    }
}

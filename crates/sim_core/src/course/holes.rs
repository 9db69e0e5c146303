//! Hole geofences: point-in-polygon labelling with a cell-quantised cache.
//!
//! Polygons are only used to answer "which hole is this position on"; the
//! lookup quantises positions to H3 resolution-12 cells (~9 m) and memoises
//! the answer, so the repeated lookups along the golfer path stay cheap.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use h3o::{CellIndex, LatLng, Resolution};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::CourseError;

const LOOKUP_CACHE_CAPACITY: usize = 8192;
const LOOKUP_RESOLUTION: Resolution = Resolution::Twelve;

/// Closed polygon for one hole; vertices are `(lat, lon)` degrees. The ring
/// may repeat the first vertex at the end or not, both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolePolygon {
    pub hole: u8,
    pub ring: Vec<(f64, f64)>,
}

/// All hole geofences of a course. Lookup order follows the input order, so
/// a position inside overlapping polygons labels to the earliest hole.
pub struct HoleLayout {
    polygons: Vec<HolePolygon>,
    cache: Mutex<LruCache<CellIndex, Option<u8>>>,
}

impl std::fmt::Debug for HoleLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoleLayout")
            .field("polygons", &self.polygons)
            .finish_non_exhaustive()
    }
}

impl HoleLayout {
    pub fn new(polygons: Vec<HolePolygon>) -> Result<Self, CourseError> {
        if polygons.is_empty() {
            return Err(CourseError::NoHolePolygons);
        }
        for polygon in &polygons {
            if polygon.hole == 0 || polygon.hole > 18 {
                return Err(CourseError::HoleOutOfRange(polygon.hole));
            }
        }
        Ok(Self {
            polygons,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(LOOKUP_CACHE_CAPACITY).expect("cache capacity must be non-zero"),
            )),
        })
    }

    pub fn polygons(&self) -> &[HolePolygon] {
        &self.polygons
    }

    pub fn hole_count(&self) -> usize {
        self.polygons.len()
    }

    /// Hole containing `(lat, lon)`, or `None` when the position is outside
    /// every polygon (cart paths between holes, the clubhouse apron).
    pub fn hole_at(&self, lat: f64, lon: f64) -> Option<u8> {
        let key = LatLng::new(lat, lon)
            .ok()
            .map(|ll| ll.to_cell(LOOKUP_RESOLUTION));
        if let Some(cell) = key {
            if let Ok(mut cache) = self.cache.lock() {
                if let Some(label) = cache.get(&cell) {
                    return *label;
                }
            }
        }

        let label = self
            .polygons
            .iter()
            .find(|p| point_in_ring(lat, lon, &p.ring))
            .map(|p| p.hole);

        if let Some(cell) = key {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(cell, label);
            }
        }
        label
    }
}

/// Even-odd ray casting; `x = lon`, `y = lat`.
fn point_in_ring(lat: f64, lon: f64, ring: &[(f64, f64)]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let (lat_i, lon_i) = ring[i];
        let (lat_j, lon_j) = ring[j];
        if (lat_i > lat) != (lat_j > lat) {
            let intersect_lon = lon_j + (lat - lat_j) / (lat_i - lat_j) * (lon_i - lon_j);
            if lon < intersect_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(hole: u8, lat0: f64, lon0: f64, side: f64) -> HolePolygon {
        HolePolygon {
            hole,
            ring: vec![
                (lat0, lon0),
                (lat0 + side, lon0),
                (lat0 + side, lon0 + side),
                (lat0, lon0 + side),
                (lat0, lon0),
            ],
        }
    }

    #[test]
    fn labels_point_inside_polygon() {
        let layout = HoleLayout::new(vec![square(1, 50.0, 8.0, 0.01), square(2, 50.0, 8.02, 0.01)])
            .expect("layout");
        assert_eq!(layout.hole_at(50.005, 8.005), Some(1));
        assert_eq!(layout.hole_at(50.005, 8.025), Some(2));
        assert_eq!(layout.hole_at(51.0, 8.0), None);
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let layout = HoleLayout::new(vec![square(7, 50.0, 8.0, 0.01)]).expect("layout");
        for _ in 0..3 {
            assert_eq!(layout.hole_at(50.001, 8.001), Some(7));
        }
    }

    #[test]
    fn rejects_out_of_range_holes_and_empty_layouts() {
        assert!(matches!(
            HoleLayout::new(vec![square(19, 50.0, 8.0, 0.01)]),
            Err(CourseError::HoleOutOfRange(19))
        ));
        assert!(matches!(
            HoleLayout::new(Vec::new()),
            Err(CourseError::NoHolePolygons)
        ));
    }
}

//! Route planning over the cart-path graph, with memoised results and the
//! time-scaled coordinate interpolation used to emit GPS-aligned tracks.
//!
//! Routing is strictly confined to the graph: an unreachable destination is
//! an explicit `None` that callers must turn into a per-order failure;
//! there is no off-graph interpolation fallback.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::Resource;
use lru::LruCache;

use crate::clock::COORD_STEP_S;
use crate::course::{haversine_m, Course, NodeId};

const ROUTE_CACHE_CAPACITY: usize = 4096;

/// A resolved cart-path route, endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub nodes: Vec<NodeId>,
    pub length_m: f64,
}

/// Whole-second drive duration for `length_m` at `speed_m_s`. Non-empty
/// drives take at least one second.
pub fn travel_time_s(length_m: f64, speed_m_s: f64) -> u64 {
    if length_m <= 0.0 {
        return 0;
    }
    let secs = length_m / speed_m_s.max(0.01);
    (secs.ceil() as u64).max(1)
}

/// Shortest-path planner with an LRU memo. Unreachable pairs are cached as
/// `None` so repeated failures stay cheap.
#[derive(Resource)]
pub struct RoutePlanner {
    course: Arc<Course>,
    cache: Mutex<LruCache<(NodeId, NodeId), Option<RoutePlan>>>,
}

impl RoutePlanner {
    pub fn new(course: Arc<Course>) -> Self {
        Self {
            course,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(ROUTE_CACHE_CAPACITY).expect("cache capacity must be non-zero"),
            )),
        }
    }

    pub fn course(&self) -> &Arc<Course> {
        &self.course
    }

    /// Distance-weighted shortest route; `None` when `to` is unreachable.
    pub fn route(&self, from: NodeId, to: NodeId) -> Option<RoutePlan> {
        let key = (from, to);
        {
            let mut cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(&key) {
                return cached.clone();
            }
        }

        let plan = self
            .course
            .graph
            .shortest_path(from, to)
            .map(|(nodes, length_m)| RoutePlan { nodes, length_m });

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, plan.clone());
        }
        plan
    }

    /// Drive duration in whole seconds; `None` when unreachable.
    pub fn drive_time_s(&self, from: NodeId, to: NodeId, speed_m_s: f64) -> Option<u64> {
        self.route(from, to)
            .map(|plan| travel_time_s(plan.length_m, speed_m_s))
    }
}

/// Timestamped coordinate along an emitted track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub ts_s: u64,
    pub lat: f64,
    pub lon: f64,
}

/// Emit coordinates along `plan` on the 60 s grid, time-scaled so the final
/// node lands exactly on `end_s`. Both endpoints are included; intermediate
/// points interpolate linearly along the route's edges. Callers overwrite
/// the final point with the snapped meeting coordinate when aligning a
/// delivery.
pub fn emit_path_coordinates(
    course: &Course,
    plan: &RoutePlan,
    start_s: u64,
    end_s: u64,
) -> Vec<TrackPoint> {
    let coords: Vec<(f64, f64)> = plan
        .nodes
        .iter()
        .filter_map(|id| course.node_latlon(*id))
        .collect();
    if coords.is_empty() {
        return Vec::new();
    }

    let first = coords[0];
    let last = coords[coords.len() - 1];
    if end_s <= start_s || coords.len() == 1 {
        return vec![TrackPoint {
            ts_s: end_s.max(start_s),
            lat: last.0,
            lon: last.1,
        }];
    }

    // Cumulative geometric distance along the node chain.
    let mut cumulative = Vec::with_capacity(coords.len());
    cumulative.push(0.0);
    for pair in coords.windows(2) {
        let step = haversine_m(pair[0].0, pair[0].1, pair[1].0, pair[1].1);
        cumulative.push(cumulative.last().copied().unwrap_or(0.0) + step);
    }
    let total = *cumulative.last().unwrap_or(&0.0);

    let duration = (end_s - start_s) as f64;
    let mut points = vec![TrackPoint {
        ts_s: start_s,
        lat: first.0,
        lon: first.1,
    }];

    let mut ts = start_s + COORD_STEP_S;
    while ts < end_s {
        let fraction = (ts - start_s) as f64 / duration;
        let target = fraction * total;
        let (lat, lon) = point_at_distance(&coords, &cumulative, target);
        points.push(TrackPoint { ts_s: ts, lat, lon });
        ts += COORD_STEP_S;
    }

    points.push(TrackPoint {
        ts_s: end_s,
        lat: last.0,
        lon: last.1,
    });
    points
}

fn point_at_distance(
    coords: &[(f64, f64)],
    cumulative: &[f64],
    target: f64,
) -> (f64, f64) {
    if target <= 0.0 {
        return coords[0];
    }
    let total = *cumulative.last().unwrap_or(&0.0);
    if target >= total {
        return coords[coords.len() - 1];
    }
    let segment = cumulative.partition_point(|d| *d <= target) - 1;
    let span = cumulative[segment + 1] - cumulative[segment];
    let t = if span > 0.0 {
        (target - cumulative[segment]) / span
    } else {
        0.0
    };
    let (lat_a, lon_a) = coords[segment];
    let (lat_b, lon_b) = coords[segment + 1];
    (lat_a + (lat_b - lat_a) * t, lon_a + (lon_b - lon_a) * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::synthetic_course;

    #[test]
    fn travel_time_rounds_up_whole_seconds() {
        assert_eq!(travel_time_s(0.0, 2.68), 0);
        assert_eq!(travel_time_s(2.68, 2.68), 1);
        assert_eq!(travel_time_s(268.0, 2.68), 100);
        assert_eq!(travel_time_s(269.0, 2.68), 101);
    }

    #[test]
    fn planner_memoises_routes() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course);
        let clubhouse = planner.course().clubhouse;
        let dst = planner.course().golfer_path.node_at(1800);

        let first = planner.route(clubhouse, dst).expect("route");
        let second = planner.route(clubhouse, dst).expect("route");
        assert_eq!(first, second);
        assert_eq!(first.nodes.first(), Some(&clubhouse));
        assert_eq!(first.nodes.last(), Some(&dst));
    }

    #[test]
    fn same_node_route_is_empty_drive() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course);
        let clubhouse = planner.course().clubhouse;
        let plan = planner.route(clubhouse, clubhouse).expect("route");
        assert_eq!(plan.length_m, 0.0);
        assert_eq!(planner.drive_time_s(clubhouse, clubhouse, 2.68), Some(0));
    }

    #[test]
    fn emitted_track_spans_start_to_end_on_the_minute_grid() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course.clone());
        let dst = course.golfer_path.node_at(3600);
        let plan = planner.route(course.clubhouse, dst).expect("route");

        let points = emit_path_coordinates(&course, &plan, 1000, 1250);
        assert_eq!(points.first().map(|p| p.ts_s), Some(1000));
        assert_eq!(points.last().map(|p| p.ts_s), Some(1250));
        // Interior points on the 60 s grid from the start.
        assert_eq!(points[1].ts_s, 1060);
        let (last_lat, last_lon) = course.node_latlon(dst).expect("coords");
        let end = points.last().expect("end");
        assert!((end.lat - last_lat).abs() < 1e-12);
        assert!((end.lon - last_lon).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_track_collapses_to_the_destination() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course.clone());
        let dst = course.golfer_path.node_at(1800);
        let plan = planner.route(course.clubhouse, dst).expect("route");
        let points = emit_path_coordinates(&course, &plan, 500, 500);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].ts_s, 500);
    }
}

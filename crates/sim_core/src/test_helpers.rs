//! Synthetic courses, tee sheets, and configs shared by tests, benches,
//! and examples. Compiled under the default-on `test-helpers` feature.

use std::sync::Arc;

use crate::course::{CartGraph, Course, GolferPath, HoleLayout, HolePolygon, NodeId, PathSample};
use crate::scenario::{SimulationConfig, TeeTime};

/// Perimeter nodes of the synthetic loop course (4 per hole, 18 holes).
pub const LOOP_NODES: u32 = 72;
/// Edge length between consecutive loop nodes, metres.
pub const LOOP_EDGE_M: f64 = 60.0;
/// Golfer dwell per node: 200 s x 72 nodes = a 4 h round.
pub const SECONDS_PER_NODE: u64 = 200;

const CENTER_LAT: f64 = 47.6205;
const CENTER_LON: f64 = -122.3493;
const M_PER_DEG_LAT: f64 = 111_320.0;
const POLYGON_MARGIN_DEG: f64 = 0.0002;

/// The stretch of loop nodes that `detached_segment_course` cuts off, and
/// an order time whose prediction lands inside it.
pub struct DetachedSegmentSpec {
    pub first_node: NodeId,
    pub last_node: NodeId,
    pub order_time_s: u64,
}

pub const DETACHED_SEGMENT: DetachedSegmentSpec = DetachedSegmentSpec {
    first_node: 40,
    last_node: 43,
    order_time_s: 7600,
};

fn loop_node_latlon(index: u32) -> (f64, f64) {
    let radius_m = LOOP_NODES as f64 * LOOP_EDGE_M / (2.0 * std::f64::consts::PI);
    let angle = 2.0 * std::f64::consts::PI * index as f64 / LOOP_NODES as f64;
    let north_m = radius_m * angle.cos();
    let east_m = radius_m * angle.sin();
    let lat = CENTER_LAT + north_m / M_PER_DEG_LAT;
    let lon = CENTER_LON + east_m / (M_PER_DEG_LAT * CENTER_LAT.to_radians().cos());
    (lat, lon)
}

fn build_loop_course(cut_edges: &[(u32, u32)]) -> Arc<Course> {
    let mut graph = CartGraph::new();
    for index in 0..LOOP_NODES {
        let (lat, lon) = loop_node_latlon(index);
        graph.add_node(lat, lon);
    }
    for index in 0..LOOP_NODES {
        let a = index;
        let b = (index + 1) % LOOP_NODES;
        if cut_edges.contains(&(a, b)) {
            continue;
        }
        graph.add_edge(a, b, LOOP_EDGE_M).expect("loop edge");
    }

    // One rectangular geofence per hole, covering its four loop nodes.
    let mut polygons = Vec::new();
    for hole in 1..=18u8 {
        let first = (hole as u32 - 1) * 4;
        let corners: Vec<(f64, f64)> = (first..first + 4).map(loop_node_latlon).collect();
        let lat_min = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let lat_max = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let lon_min = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let lon_max = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        polygons.push(HolePolygon {
            hole,
            ring: vec![
                (lat_min - POLYGON_MARGIN_DEG, lon_min - POLYGON_MARGIN_DEG),
                (lat_max + POLYGON_MARGIN_DEG, lon_min - POLYGON_MARGIN_DEG),
                (lat_max + POLYGON_MARGIN_DEG, lon_max + POLYGON_MARGIN_DEG),
                (lat_min - POLYGON_MARGIN_DEG, lon_max + POLYGON_MARGIN_DEG),
            ],
        });
    }
    let holes = HoleLayout::new(polygons).expect("hole layout");

    let round_s = LOOP_NODES as u64 * SECONDS_PER_NODE;
    let mut samples = Vec::new();
    let mut elapsed = 0;
    while elapsed <= round_s {
        let node = ((elapsed / SECONDS_PER_NODE) as u32).min(LOOP_NODES - 1);
        samples.push(PathSample {
            node,
            elapsed_s: elapsed,
        });
        elapsed += 60;
    }
    let golfer_path = GolferPath::new(samples).expect("golfer path");

    Arc::new(
        Course::assemble(graph, 0, holes, golfer_path, None, 2.68).expect("synthetic course"),
    )
}

/// An 18-hole loop course: 72 nodes 60 m apart, clubhouse at node 0, a
/// 4 h golfer round sampled every 60 s. Farthest node is ~2.2 km of cart
/// path away, so drives stay under ~14 min at the default speed.
pub fn synthetic_course() -> Arc<Course> {
    build_loop_course(&[])
}

/// The loop course with the edges around nodes 40..=43 removed: that
/// stretch stays on the golfer path but cannot be reached by cart, so
/// orders predicted to meet there fail as unroutable.
pub fn detached_segment_course() -> Arc<Course> {
    build_loop_course(&[
        (DETACHED_SEGMENT.first_node - 1, DETACHED_SEGMENT.first_node),
        (DETACHED_SEGMENT.last_node, DETACHED_SEGMENT.last_node + 1),
    ])
}

/// A tee sheet of `groups` groups spaced `interval_s` apart from service
/// open, sizes cycling 1..=4.
pub fn tee_sheet(groups: u32, interval_s: u64) -> Vec<TeeTime> {
    (0..groups)
        .map(|index| TeeTime {
            group_id: index + 1,
            tee_time_s: index as u64 * interval_s,
            size: (index % 4 + 1) as u8,
        })
        .collect()
}

/// Baseline config for the synthetic course: 7 h window, uniform demand,
/// defaults everywhere else.
pub fn base_config() -> SimulationConfig {
    SimulationConfig::default().with_seed(7)
}

//! The immutable course bundle: cart-path graph, hole geofences, golfer
//! path, clubhouse, and the node-to-clubhouse travel-time cache. Loaded
//! once per run and shared read-only (`Arc<Course>`) by every component.

mod graph;
mod holes;
mod loader;
mod path;

use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::warn;

pub use graph::{haversine_m, CartGraph, GraphNode, NodeId};
pub use holes::{HoleLayout, HolePolygon};
pub use loader::{load_course_bundle, CourseManifest};
pub use path::{GolferPath, PathSample};

use crate::error::CourseError;

#[derive(Debug)]
pub struct Course {
    pub graph: CartGraph,
    pub clubhouse: NodeId,
    pub holes: HoleLayout,
    pub golfer_path: GolferPath,
    /// Seconds from the clubhouse at the reference speed. A cache: routing
    /// always re-derives exact paths, this only feeds estimates.
    pub travel_times: HashMap<NodeId, f64>,
    /// Hole label per golfer-path sample, gap-filled with the last valid
    /// hole so positions off every polygon still label deterministically.
    path_holes: Vec<u8>,
}

/// Shared handle to the course, inserted as an ECS resource.
#[derive(Resource, Clone)]
pub struct CourseResource(pub Arc<Course>);

impl Course {
    /// Assemble and validate a course. `travel_times` may be omitted, in
    /// which case the table is computed from the graph at `reference_speed`.
    ///
    /// Structural problems (empty graph, isolated clubhouse, bad golfer
    /// path) are fatal. Individually unreachable nodes are only reported:
    /// they surface later as per-order `unroutable` failures.
    pub fn assemble(
        graph: CartGraph,
        clubhouse: NodeId,
        holes: HoleLayout,
        golfer_path: GolferPath,
        travel_times: Option<HashMap<NodeId, f64>>,
        reference_speed_m_s: f64,
    ) -> Result<Self, CourseError> {
        if graph.node_count() == 0 {
            return Err(CourseError::EmptyGraph);
        }
        if graph.node(clubhouse).is_none() {
            return Err(CourseError::UnknownEdgeNode(clubhouse));
        }
        let reachable = graph.reachable_count(clubhouse);
        if graph.node_count() > 1 && reachable <= 1 {
            return Err(CourseError::IsolatedClubhouse(clubhouse));
        }
        if reachable < graph.node_count() {
            warn!(
                "{} of {} cart-path nodes are unreachable from the clubhouse",
                graph.node_count() - reachable,
                graph.node_count()
            );
        }
        for sample in golfer_path.samples() {
            if graph.node(sample.node).is_none() {
                return Err(CourseError::UnknownPathNode(sample.node));
            }
        }

        let travel_times = travel_times
            .unwrap_or_else(|| graph.travel_times_from(clubhouse, reference_speed_m_s));
        let path_holes = label_path_samples(&graph, &holes, &golfer_path)?;

        Ok(Self {
            graph,
            clubhouse,
            holes,
            golfer_path,
            travel_times,
            path_holes,
        })
    }

    pub fn node_latlon(&self, id: NodeId) -> Option<(f64, f64)> {
        self.graph.node(id).map(|n| (n.lat, n.lon))
    }

    pub fn round_duration_s(&self) -> u64 {
        self.golfer_path.round_duration_s()
    }

    /// Cached travel time from the clubhouse; `None` for unreachable nodes.
    pub fn travel_time_from_clubhouse(&self, node: NodeId) -> Option<f64> {
        self.travel_times.get(&node).copied()
    }

    /// Hole label of a golfer-path sample (gap-filled).
    pub fn hole_at_sample(&self, index: usize) -> u8 {
        self.path_holes[index.min(self.path_holes.len() - 1)]
    }

    /// Node a group that teed off at `tee_time_s` occupies at absolute time
    /// `t_s` (clamped to the round).
    pub fn group_node_at(&self, tee_time_s: u64, t_s: u64) -> NodeId {
        self.golfer_path.node_at(t_s.saturating_sub(tee_time_s))
    }

    /// Hole that group is on at absolute time `t_s`, falling back to the
    /// last valid hole when the position is outside every polygon.
    pub fn group_hole_at(&self, tee_time_s: u64, t_s: u64) -> u8 {
        let elapsed = t_s.saturating_sub(tee_time_s);
        self.hole_at_sample(self.golfer_path.sample_index_at(elapsed))
    }
}

/// Label every golfer-path sample with its hole, forward-filling gaps with
/// the last valid hole and back-filling the head from the first valid one.
fn label_path_samples(
    graph: &CartGraph,
    holes: &HoleLayout,
    path: &GolferPath,
) -> Result<Vec<u8>, CourseError> {
    let raw: Vec<Option<u8>> = path
        .samples()
        .iter()
        .map(|s| {
            graph
                .node(s.node)
                .and_then(|n| holes.hole_at(n.lat, n.lon))
        })
        .collect();

    let first_valid = raw
        .iter()
        .flatten()
        .next()
        .copied()
        .ok_or(CourseError::GolferPathOutsideHoles)?;

    let mut labels = Vec::with_capacity(raw.len());
    let mut last = first_valid;
    for label in raw {
        if let Some(hole) = label {
            last = hole;
        }
        labels.push(last);
    }
    Ok(labels)
}

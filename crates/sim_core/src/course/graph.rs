//! Cart-path graph: geographic nodes, metre-weighted edges, Dijkstra routing.
//!
//! Edge weights are stored as integer millimetres so path costs are `Ord`
//! for the Dijkstra search; public APIs speak metres.

use std::collections::{HashMap, VecDeque};

use pathfinding::prelude::{dijkstra, dijkstra_all};

use crate::error::CourseError;

pub type NodeId = u32;

const MM_PER_M: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

/// Undirected weighted graph of drivable cart paths. Adjacency lists keep
/// insertion order, so route searches are deterministic.
#[derive(Debug, Clone, Default)]
pub struct CartGraph {
    nodes: Vec<GraphNode>,
    adjacency: Vec<Vec<(NodeId, u64)>>,
}

impl CartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id (ids are dense, in insertion order).
    pub fn add_node(&mut self, lat: f64, lon: f64) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(GraphNode { id, lat, lon });
        self.adjacency.push(Vec::new());
        id
    }

    /// Add an undirected edge of `length_m` metres between `a` and `b`.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, length_m: f64) -> Result<(), CourseError> {
        if self.node(a).is_none() {
            return Err(CourseError::UnknownEdgeNode(a));
        }
        if self.node(b).is_none() {
            return Err(CourseError::UnknownEdgeNode(b));
        }
        if length_m <= 0.0 {
            return Err(CourseError::NonPositiveEdgeLength(length_m));
        }
        let weight_mm = (length_m * MM_PER_M).round() as u64;
        self.adjacency[a as usize].push((b, weight_mm));
        self.adjacency[b as usize].push((a, weight_mm));
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, u64)] {
        self.adjacency
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Length in metres of the direct edge `a`–`b`, if one exists.
    pub fn edge_length_m(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.neighbors(a)
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, mm)| *mm as f64 / MM_PER_M)
    }

    /// Node closest to `(lat, lon)` by great-circle distance. Linear scan;
    /// callers that query repeatedly must cache the result.
    pub fn nearest_node(&self, lat: f64, lon: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .map(|n| (haversine_m(lat, lon, n.lat, n.lon), n.id))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, id)| id)
    }

    /// Distance-weighted shortest path. Returns the node sequence (including
    /// both endpoints) and the total length in metres; `None` when `dst` is
    /// unreachable from `src`.
    pub fn shortest_path(&self, src: NodeId, dst: NodeId) -> Option<(Vec<NodeId>, f64)> {
        self.node(src)?;
        self.node(dst)?;
        if src == dst {
            return Some((vec![src], 0.0));
        }
        dijkstra(
            &src,
            |n| self.adjacency[*n as usize].iter().copied(),
            |n| *n == dst,
        )
        .map(|(nodes, cost_mm)| (nodes, cost_mm as f64 / MM_PER_M))
    }

    /// Shortest-path time in seconds from `src` to every reachable node,
    /// at `speed_m_s`. Single-source Dijkstra; `src` itself maps to 0.
    pub fn travel_times_from(&self, src: NodeId, speed_m_s: f64) -> HashMap<NodeId, f64> {
        let mut times = HashMap::new();
        if self.node(src).is_none() {
            return times;
        }
        times.insert(src, 0.0);
        let reached = dijkstra_all(&src, |n| self.adjacency[*n as usize].iter().copied());
        for (node, (_, cost_mm)) in reached {
            times.insert(node, cost_mm as f64 / MM_PER_M / speed_m_s.max(0.01));
        }
        times
    }

    /// Number of nodes reachable from `from`, counting `from` itself.
    pub fn reachable_count(&self, from: NodeId) -> usize {
        if self.node(from).is_none() {
            return 0;
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([from]);
        seen[from as usize] = true;
        let mut count = 0;
        while let Some(n) = queue.pop_front() {
            count += 1;
            for (next, _) in &self.adjacency[n as usize] {
                if !seen[*next as usize] {
                    seen[*next as usize] = true;
                    queue.push_back(*next);
                }
            }
        }
        count
    }
}

/// Great-circle distance in metres.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    6_371_000.0 * c
}

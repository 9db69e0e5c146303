//! Course bundle loader.
//!
//! A bundle is a directory of plain files prepared offline:
//!
//! - `course.json`: manifest with name, clubhouse coordinate, reference speed
//! - `nodes.csv`: `node_id,lat,lon`
//! - `edges.csv`: `from_node,to_node,length_m`
//! - `hole_polygons.json`: array of `{hole, ring: [[lat, lon], ...]}`
//! - `golfer_path.csv`: `node_id,elapsed_s`, 60 s resolution
//! - `travel_times.csv`: `node_id,travel_s` (optional; recomputed when absent)
//!
//! External node ids may be arbitrary; they are mapped to dense internal
//! ids in file order.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::course::{CartGraph, Course, GolferPath, HoleLayout, HolePolygon, NodeId, PathSample};
use crate::error::CourseError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseManifest {
    pub name: String,
    pub clubhouse_lat: f64,
    pub clubhouse_lon: f64,
    /// Reference speed for the travel-time table (m/s).
    pub reference_speed_m_s: f64,
}

#[derive(Debug, Deserialize)]
struct NodeRow {
    node_id: u32,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    from_node: u32,
    to_node: u32,
    length_m: f64,
}

#[derive(Debug, Deserialize)]
struct PathRow {
    node_id: u32,
    elapsed_s: u64,
}

#[derive(Debug, Deserialize)]
struct TravelTimeRow {
    node_id: u32,
    travel_s: f64,
}

fn require(path: &Path) -> Result<&Path, CourseError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(CourseError::MissingFile(path.to_path_buf()))
    }
}

/// Load and validate a course bundle from `dir`.
pub fn load_course_bundle(dir: &Path) -> Result<Course, CourseError> {
    let manifest_file = File::open(require(&dir.join("course.json"))?)?;
    let manifest: CourseManifest = serde_json::from_reader(manifest_file)?;

    let mut graph = CartGraph::new();
    let mut id_map: HashMap<u32, NodeId> = HashMap::new();
    let mut nodes = csv::Reader::from_path(require(&dir.join("nodes.csv"))?)?;
    for row in nodes.deserialize() {
        let row: NodeRow = row?;
        let internal = graph.add_node(row.lat, row.lon);
        id_map.insert(row.node_id, internal);
    }

    let mut edges = csv::Reader::from_path(require(&dir.join("edges.csv"))?)?;
    for row in edges.deserialize() {
        let row: EdgeRow = row?;
        let from = *id_map
            .get(&row.from_node)
            .ok_or(CourseError::UnknownEdgeNode(row.from_node))?;
        let to = *id_map
            .get(&row.to_node)
            .ok_or(CourseError::UnknownEdgeNode(row.to_node))?;
        graph.add_edge(from, to, row.length_m)?;
    }

    let polygons_file = File::open(require(&dir.join("hole_polygons.json"))?)?;
    let polygons: Vec<HolePolygon> = serde_json::from_reader(polygons_file)?;
    let holes = HoleLayout::new(polygons)?;

    let mut samples = Vec::new();
    let mut path_rows = csv::Reader::from_path(require(&dir.join("golfer_path.csv"))?)?;
    for row in path_rows.deserialize() {
        let row: PathRow = row?;
        let node = *id_map
            .get(&row.node_id)
            .ok_or(CourseError::UnknownPathNode(row.node_id))?;
        samples.push(PathSample {
            node,
            elapsed_s: row.elapsed_s,
        });
    }
    let golfer_path = GolferPath::new(samples)?;

    let travel_times_path = dir.join("travel_times.csv");
    let travel_times = if travel_times_path.exists() {
        let mut table = HashMap::new();
        let mut rows = csv::Reader::from_path(&travel_times_path)?;
        for row in rows.deserialize() {
            let row: TravelTimeRow = row?;
            let node = *id_map
                .get(&row.node_id)
                .ok_or(CourseError::UnknownEdgeNode(row.node_id))?;
            table.insert(node, row.travel_s);
        }
        Some(table)
    } else {
        None
    };

    let clubhouse = graph
        .nearest_node(manifest.clubhouse_lat, manifest.clubhouse_lon)
        .ok_or(CourseError::ClubhouseOffGraph {
            lat: manifest.clubhouse_lat,
            lon: manifest.clubhouse_lon,
        })?;

    Course::assemble(
        graph,
        clubhouse,
        holes,
        golfer_path,
        travel_times,
        manifest.reference_speed_m_s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).expect("create file");
        file.write_all(contents.as_bytes()).expect("write file");
    }

    fn write_minimal_bundle(dir: &Path) {
        write_file(
            dir,
            "course.json",
            r#"{"name":"two-node","clubhouse_lat":50.0,"clubhouse_lon":8.0,"reference_speed_m_s":2.68}"#,
        );
        write_file(dir, "nodes.csv", "node_id,lat,lon\n10,50.0,8.0\n20,50.0,8.001\n");
        write_file(dir, "edges.csv", "from_node,to_node,length_m\n10,20,71.5\n");
        write_file(
            dir,
            "hole_polygons.json",
            r#"[{"hole":1,"ring":[[49.9,7.9],[50.1,7.9],[50.1,8.1],[49.9,8.1]]}]"#,
        );
        write_file(dir, "golfer_path.csv", "node_id,elapsed_s\n10,0\n20,60\n");
    }

    #[test]
    fn loads_a_minimal_bundle() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());

        let course = load_course_bundle(dir.path()).expect("load");
        assert_eq!(course.graph.node_count(), 2);
        assert_eq!(course.clubhouse, 0);
        assert_eq!(course.round_duration_s(), 60);
        // Travel-time table recomputed from the graph.
        assert!(course.travel_time_from_clubhouse(1).expect("time") > 0.0);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());
        std::fs::remove_file(dir.path().join("edges.csv")).expect("remove");

        let err = load_course_bundle(dir.path());
        assert!(matches!(err, Err(CourseError::MissingFile(_))));
    }

    #[test]
    fn explicit_travel_times_override_the_computed_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());
        write_file(dir.path(), "travel_times.csv", "node_id,travel_s\n10,0\n20,33.5\n");

        let course = load_course_bundle(dir.path()).expect("load");
        assert_eq!(course.travel_time_from_clubhouse(1), Some(33.5));
    }
}

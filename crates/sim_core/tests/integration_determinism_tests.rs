//! Determinism and output-file invariants: identical inputs produce
//! byte-identical files, and the delivery-point projection keeps its
//! paired-row shape through a write/read cycle.

mod support;

use sim_core::ecs::OrderStatus;
use sim_core::runner::run_simulation;
use sim_core::telemetry_export::{
    read_coordinates_csv, write_coordinates_csv, write_delivery_points_csv, write_events_csv,
    write_results_json,
};
use sim_core::test_helpers::{base_config, synthetic_course, tee_sheet};

use support::assert_status_accounting;

#[test]
fn identical_inputs_produce_byte_identical_outputs() {
    let course = synthetic_course();
    let sheet = tee_sheet(10, 900);
    let config = base_config().with_total_orders(12).with_runner_count(2);

    let dir = tempfile::tempdir().expect("tempdir");
    let mut files = Vec::new();
    for run in 0..2 {
        let result = run_simulation(course.clone(), &config, &sheet).expect("run");
        let events_path = dir.path().join(format!("events-{run}.csv"));
        let results_path = dir.path().join(format!("results-{run}.json"));
        let coords_path = dir.path().join(format!("coordinates-{run}.csv"));
        write_events_csv(&result.events, &events_path).expect("events");
        write_results_json(&result, &results_path).expect("results");
        write_coordinates_csv(&result.coordinates, &coords_path).expect("coordinates");
        files.push((events_path, results_path, coords_path));
    }

    let read = |path: &std::path::Path| std::fs::read(path).expect("read");
    assert_eq!(read(&files[0].0), read(&files[1].0), "events.csv must be identical");
    assert_eq!(read(&files[0].1), read(&files[1].1), "results.json must be identical");
    assert_eq!(read(&files[0].2), read(&files[1].2), "coordinates.csv must be identical");
}

#[test]
fn every_delivery_emits_one_coincident_golfer_runner_pair() {
    let course = synthetic_course();
    let sheet = tee_sheet(10, 900);
    let config = base_config().with_total_orders(12).with_runner_count(2);

    let result = run_simulation(course, &config, &sheet).expect("run");
    assert_status_accounting(&result);

    for order in &result.orders {
        if order.status != OrderStatus::Delivered {
            continue;
        }
        let flagged: Vec<_> = result
            .coordinates
            .iter()
            .filter(|r| {
                r.is_delivery_event && r.order_id.as_deref() == Some(order.order_id.as_str())
            })
            .collect();
        assert_eq!(flagged.len(), 2, "{} needs exactly two flagged rows", order.order_id);
        assert_eq!(flagged[0].ts_s, flagged[1].ts_s);
        assert_eq!(flagged[0].lat, flagged[1].lat);
        assert_eq!(flagged[0].lon, flagged[1].lon);
        assert_ne!(flagged[0].actor_kind, flagged[1].actor_kind);
        assert_eq!(Some(flagged[0].ts_s), order.actual_meeting_s);
    }
}

#[test]
fn coordinates_round_trip_preserves_the_delivery_projection() {
    let course = synthetic_course();
    let sheet = tee_sheet(10, 900);
    let config = base_config().with_total_orders(8).with_runner_count(2);

    let result = run_simulation(course, &config, &sheet).expect("run");

    let dir = tempfile::tempdir().expect("tempdir");
    let full_path = dir.path().join("coordinates.csv");
    let points_path = dir.path().join("coordinates_delivery_points.csv");
    write_coordinates_csv(&result.coordinates, &full_path).expect("write full");
    write_delivery_points_csv(&result.coordinates, &points_path).expect("write points");

    let reread = read_coordinates_csv(&full_path).expect("reread");
    assert_eq!(reread, result.coordinates);

    let projection: Vec<_> = reread.into_iter().filter(|r| r.is_delivery_event).collect();
    let written_points = read_coordinates_csv(&points_path).expect("reread points");
    assert_eq!(projection, written_points);

    let delivered = result
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .count();
    assert_eq!(written_points.len(), delivered * 2);
}

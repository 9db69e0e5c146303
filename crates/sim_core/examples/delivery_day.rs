//! Run one service day on the synthetic course and write the full output
//! set to `./out`.
//!
//! ```sh
//! cargo run --example delivery_day
//! ```

use std::fs;
use std::path::Path;

use sim_core::runner::run_simulation;
use sim_core::telemetry_export::{
    write_coordinates_csv, write_coordinates_parquet, write_delivery_points_csv,
    write_events_csv, write_metrics_json, write_results_json,
};
use sim_core::test_helpers::{base_config, synthetic_course, tee_sheet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let course = synthetic_course();
    let config = base_config().with_total_orders(30).with_runner_count(2);
    let sheet = tee_sheet(12, 900);

    let result = run_simulation(course, &config, &sheet)?;

    let out = Path::new("out");
    fs::create_dir_all(out)?;
    write_coordinates_csv(&result.coordinates, out.join("coordinates.csv"))?;
    write_delivery_points_csv(
        &result.coordinates,
        out.join("coordinates_delivery_points.csv"),
    )?;
    write_coordinates_parquet(&result.coordinates, out.join("coordinates.parquet"))?;
    write_events_csv(&result.events, out.join("events.csv"))?;
    write_results_json(&result, out.join("results.json"))?;
    write_metrics_json(&result.metrics, out.join("simulation_metrics.json"))?;

    let metrics = &result.metrics;
    println!(
        "orders: {} delivered, {} failed, {} pending",
        metrics.delivered, metrics.failed, metrics.pending
    );
    if let Some(on_time) = metrics.on_time_rate {
        println!("on-time rate: {on_time:.3}");
    }
    if let Some(p90) = metrics.p90_delivery_cycle_s {
        println!("p90 delivery cycle: {p90:.0} s");
    }
    println!(
        "utilization: {:.3} (shift basis), revenue: {:.2}",
        metrics.runner_utilization, metrics.revenue
    );
    println!("outputs written to {}", out.display());
    Ok(())
}

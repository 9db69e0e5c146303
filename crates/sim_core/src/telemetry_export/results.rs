//! JSON result documents: `results.json` (orders with full lifecycle plus
//! the configuration snapshot) and `simulation_metrics.json` (per-run KPIs).

use std::error::Error;
use std::fs::File;
use std::path::Path;

use crate::metrics::{RunMetrics, RunResult};

pub fn write_results_json<P: AsRef<Path>>(
    result: &RunResult,
    path: P,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

pub fn write_metrics_json<P: AsRef<Path>>(
    metrics: &RunMetrics,
    path: P,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::run_simulation;
    use crate::test_helpers::{base_config, synthetic_course, tee_sheet};

    #[test]
    fn results_json_carries_orders_and_config_but_not_raw_streams() {
        let course = synthetic_course();
        let config = base_config().with_total_orders(3);
        let result = run_simulation(course, &config, &tee_sheet(6, 900)).expect("run");

        let file = tempfile::NamedTempFile::new().expect("tempfile");
        write_results_json(&result, file.path()).expect("write");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(value["orders"].as_array().map(Vec::len), Some(3));
        assert!(value["config"]["runner_speed_m_s"].is_number());
        assert!(value["metrics"]["total_orders"].is_number());
        assert!(value.get("coordinates").is_none());
        assert!(value.get("events").is_none());
    }

    #[test]
    fn undefined_kpis_serialise_as_null() {
        let course = synthetic_course();
        let config = base_config().with_total_orders(0);
        let result = run_simulation(course, &config, &tee_sheet(2, 600)).expect("run");

        let file = tempfile::NamedTempFile::new().expect("tempfile");
        write_metrics_json(&result.metrics, file.path()).expect("write");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
        assert!(value["on_time_rate"].is_null());
        assert!(value["p90_delivery_cycle_s"].is_null());
        assert_eq!(value["total_orders"].as_u64(), Some(0));
    }
}

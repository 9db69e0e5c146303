//! Sweep exports: `staffing_summary.csv` with mean ± CI columns and the
//! frontier/knee/stability flags, plus parquet and JSON mirrors.

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::staffing::StaffingRecommendation;

const SUMMARY_HEADER: [&str; 21] = [
    "scenario",
    "order_level",
    "runner_count",
    "runs",
    "on_time_mean",
    "on_time_std",
    "wilson_lo",
    "failed_mean",
    "failed_std",
    "failed_hi",
    "p90_mean",
    "p90_std",
    "p90_hi",
    "orders_per_runner_hour_mean",
    "orders_per_runner_hour_std",
    "utilization_mean",
    "revenue_mean",
    "score",
    "frontier_flag",
    "knee_flag",
    "stability_flag",
];

/// One row per (scenario, order_level, runner_count).
pub fn write_staffing_summary_csv<P: AsRef<Path>>(
    recommendations: &[StaffingRecommendation],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(SUMMARY_HEADER)?;
    for recommendation in recommendations {
        for row in &recommendation.rows {
            let a = &row.aggregate;
            writer.write_record([
                recommendation.scenario_id.as_str(),
                recommendation.order_level.to_string().as_str(),
                row.runner_count.to_string().as_str(),
                a.runs.to_string().as_str(),
                a.on_time_rate.mean.to_string().as_str(),
                a.on_time_rate.std.to_string().as_str(),
                a.wilson_on_time_lo.to_string().as_str(),
                a.failed_rate.mean.to_string().as_str(),
                a.failed_rate.std.to_string().as_str(),
                a.failed_rate_hi.to_string().as_str(),
                a.p90_delivery_cycle_s.mean.to_string().as_str(),
                a.p90_delivery_cycle_s.std.to_string().as_str(),
                a.p90_hi.to_string().as_str(),
                a.orders_per_runner_hour.mean.to_string().as_str(),
                a.orders_per_runner_hour.std.to_string().as_str(),
                a.runner_utilization.mean.to_string().as_str(),
                a.revenue.mean.to_string().as_str(),
                row.score.to_string().as_str(),
                if row.on_frontier { "true" } else { "false" },
                if row.knee { "true" } else { "false" },
                if row.stable { "true" } else { "false" },
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Full recommendation documents, including the per-level recommended
/// runner count (or null for "no viable staffing").
pub fn export_recommendations_json<P: AsRef<Path>>(
    recommendations: &[StaffingRecommendation],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, recommendations)?;
    Ok(())
}

/// Columnar mirror of the staffing summary for analysis tooling.
pub fn write_staffing_parquet<P: AsRef<Path>>(
    recommendations: &[StaffingRecommendation],
    path: P,
) -> Result<(), Box<dyn Error>> {
    let mut scenario = Vec::new();
    let mut order_level = Vec::new();
    let mut runner_count = Vec::new();
    let mut on_time_mean = Vec::new();
    let mut wilson_lo = Vec::new();
    let mut failed_mean = Vec::new();
    let mut p90_mean = Vec::new();
    let mut oprh_mean = Vec::new();
    let mut score = Vec::new();
    let mut frontier = Vec::new();
    let mut knee = Vec::new();
    let mut stable = Vec::new();

    for recommendation in recommendations {
        for row in &recommendation.rows {
            scenario.push(recommendation.scenario_id.clone());
            order_level.push(recommendation.order_level as u64);
            runner_count.push(row.runner_count as u64);
            on_time_mean.push(row.aggregate.on_time_rate.mean);
            wilson_lo.push(row.aggregate.wilson_on_time_lo);
            failed_mean.push(row.aggregate.failed_rate.mean);
            p90_mean.push(row.aggregate.p90_delivery_cycle_s.mean);
            oprh_mean.push(row.aggregate.orders_per_runner_hour.mean);
            score.push(row.score);
            frontier.push(row.on_frontier);
            knee.push(row.knee);
            stable.push(row.stable);
        }
    }

    let schema = Schema::new(vec![
        Field::new("scenario", DataType::Utf8, false),
        Field::new("order_level", DataType::UInt64, false),
        Field::new("runner_count", DataType::UInt64, false),
        Field::new("on_time_mean", DataType::Float64, false),
        Field::new("wilson_lo", DataType::Float64, false),
        Field::new("failed_mean", DataType::Float64, false),
        Field::new("p90_mean", DataType::Float64, false),
        Field::new("orders_per_runner_hour_mean", DataType::Float64, false),
        Field::new("score", DataType::Float64, false),
        Field::new("frontier_flag", DataType::Boolean, false),
        Field::new("knee_flag", DataType::Boolean, false),
        Field::new("stability_flag", DataType::Boolean, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(scenario)),
        Arc::new(UInt64Array::from(order_level)),
        Arc::new(UInt64Array::from(runner_count)),
        Arc::new(Float64Array::from(on_time_mean)),
        Arc::new(Float64Array::from(wilson_lo)),
        Arc::new(Float64Array::from(failed_mean)),
        Arc::new(Float64Array::from(p90_mean)),
        Arc::new(Float64Array::from(oprh_mean)),
        Arc::new(Float64Array::from(score)),
        Arc::new(BooleanArray::from(frontier)),
        Arc::new(BooleanArray::from(knee)),
        Arc::new(BooleanArray::from(stable)),
    ];

    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_runs, ServiceTargets};
    use crate::staffing::evaluate_staffing;
    use sim_core::runner::run_simulation;
    use sim_core::test_helpers::{base_config, synthetic_course, tee_sheet};

    fn sample_recommendations() -> Vec<StaffingRecommendation> {
        let course = synthetic_course();
        let sheet = tee_sheet(10, 900);
        let targets = ServiceTargets::default();
        let candidates: Vec<(u32, crate::aggregate::Aggregate)> = [1u32, 2]
            .into_iter()
            .map(|runner_count| {
                let config = base_config()
                    .with_total_orders(8)
                    .with_runner_count(runner_count);
                let result =
                    run_simulation(course.clone(), &config, &sheet).expect("run");
                (
                    runner_count,
                    aggregate_runs(std::slice::from_ref(&result.metrics), &targets),
                )
            })
            .collect();
        vec![evaluate_staffing("export-test", 8, &candidates)]
    }

    #[test]
    fn summary_csv_has_stable_columns_and_one_row_per_candidate() {
        let recommendations = sample_recommendations();
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        write_staffing_summary_csv(&recommendations, file.path()).expect("write");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(SUMMARY_HEADER.join(",").as_str()));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn json_export_round_trips_the_recommendation() {
        let recommendations = sample_recommendations();
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        export_recommendations_json(&recommendations, file.path()).expect("write");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).expect("read"))
                .expect("json");
        assert_eq!(value[0]["scenario_id"], "export-test");
        assert_eq!(value[0]["rows"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn parquet_export_produces_a_file() {
        let recommendations = sample_recommendations();
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        write_staffing_parquet(&recommendations, file.path()).expect("write");
        assert!(std::fs::metadata(file.path()).expect("metadata").len() > 0);
    }
}

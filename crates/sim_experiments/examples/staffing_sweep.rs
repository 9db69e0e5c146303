//! Sweep runner counts across two order volumes on the synthetic course
//! and print the staffing recommendation per volume.
//!
//! ```sh
//! cargo run --example staffing_sweep
//! ```

use sim_core::test_helpers::{base_config, synthetic_course, tee_sheet};
use sim_experiments::{
    evaluate_sweep, export_recommendations_json, run_staffing_sweep, write_staffing_parquet,
    write_staffing_summary_csv, ServiceTargets, StaffingSpace,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let course = synthetic_course();
    let sheet = tee_sheet(12, 900);
    let space = StaffingSpace::new("synthetic-loop", base_config())
        .order_levels(vec![20, 40, 60])
        .runner_counts(vec![1, 2, 3, 4])
        .runs_per_combination(10);

    let outcomes = run_staffing_sweep(&course, &sheet, space.generate(), None, true);
    let recommendations = evaluate_sweep(&outcomes, &ServiceTargets::default());

    for recommendation in &recommendations {
        match recommendation.recommended_runner_count {
            Some(count) => println!(
                "{} orders: recommend {count} runner(s)",
                recommendation.order_level
            ),
            None => println!(
                "{} orders: no viable staffing at this volume",
                recommendation.order_level
            ),
        }
        for row in &recommendation.rows {
            println!(
                "  r={} on_time={:.3} (wilson_lo {:.3}) failed={:.3} p90={:.0}s \
                 oprh={:.2} score={:.3}{}{}{}",
                row.runner_count,
                row.aggregate.on_time_rate.mean,
                row.aggregate.wilson_on_time_lo,
                row.aggregate.failed_rate.mean,
                row.aggregate.p90_delivery_cycle_s.mean,
                row.aggregate.orders_per_runner_hour.mean,
                row.score,
                if row.on_frontier { " [frontier]" } else { "" },
                if row.knee { " [knee]" } else { "" },
                if row.stable { " [stable]" } else { "" },
            );
        }
    }

    write_staffing_summary_csv(&recommendations, "staffing_summary.csv")?;
    write_staffing_parquet(&recommendations, "staffing_summary.parquet")?;
    export_recommendations_json(&recommendations, "staffing_recommendations.json")?;
    println!("wrote staffing_summary.csv / .parquet / staffing_recommendations.json");
    Ok(())
}

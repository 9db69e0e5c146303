//! Parallel sweep execution using rayon.
//!
//! Each combination's repetitions run sequentially inside one rayon task;
//! combinations run concurrently with no shared mutable state. A
//! combination whose runs error or blow the step budget is recorded as
//! missing and excluded from aggregation; partial results are never used.

use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use rayon::prelude::*;
use sim_core::course::Course;
use sim_core::metrics::RunMetrics;
use sim_core::runner::{run_simulation, MAX_STEPS};
use sim_core::scenario::TeeTime;
use std::sync::Arc;

use crate::parameters::Combination;

/// Outcome of one combination: all repetitions, or the reason it is
/// missing.
#[derive(Debug)]
pub struct CombinationOutcome {
    pub scenario_id: String,
    pub combination_index: usize,
    pub order_level: u32,
    pub runner_count: u32,
    pub runs: Result<Vec<RunMetrics>, String>,
}

fn run_combination(
    course: &Arc<Course>,
    tee_sheet: &[TeeTime],
    combination: &Combination,
) -> Result<Vec<RunMetrics>, String> {
    let mut runs = Vec::with_capacity(combination.run_configs.len());
    for config in &combination.run_configs {
        let result = run_simulation(course.clone(), config, tee_sheet)
            .map_err(|error| format!("run failed: {error}"))?;
        if result.steps_executed >= MAX_STEPS {
            return Err(format!(
                "step budget exhausted after {} events",
                result.steps_executed
            ));
        }
        runs.push(result.metrics);
    }
    Ok(runs)
}

/// Run every combination, spreading them across the rayon thread pool.
/// Results come back in input order.
pub fn run_staffing_sweep(
    course: &Arc<Course>,
    tee_sheet: &[TeeTime],
    combinations: Vec<Combination>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<CombinationOutcome> {
    let total = combinations.len();
    let progress = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("failed to create thread pool");

    let progress_clone = progress.clone();
    let outcomes: Vec<CombinationOutcome> = pool.install(|| {
        combinations
            .par_iter()
            .map(|combination| {
                let runs = run_combination(course, tee_sheet, combination);
                if let Err(reason) = &runs {
                    warn!(
                        "combination {} (orders {}, runners {}) missing: {reason}",
                        combination.combination_index,
                        combination.order_level,
                        combination.runner_count
                    );
                }
                if let Some(bar) = &progress_clone {
                    bar.inc(1);
                }
                CombinationOutcome {
                    scenario_id: combination.scenario_id.clone(),
                    combination_index: combination.combination_index,
                    order_level: combination.order_level,
                    runner_count: combination.runner_count,
                    runs,
                }
            })
            .collect()
    });

    if let Some(bar) = &progress {
        bar.finish_with_message("Completed");
    }

    outcomes
}

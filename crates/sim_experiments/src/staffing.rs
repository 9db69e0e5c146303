//! Staffing recommendation: composite scoring, Pareto frontier over the
//! four service KPIs, and knee-point detection for diminishing returns.

use serde::Serialize;

use crate::aggregate::{aggregate_runs, Aggregate, ServiceTargets};
use crate::runner::CombinationOutcome;

const WEIGHT_ON_TIME: f64 = 0.3;
const WEIGHT_NOT_FAILED: f64 = 0.3;
const WEIGHT_P90: f64 = 0.2;
const WEIGHT_THROUGHPUT: f64 = 0.2;

/// One staffing candidate, annotated by the recommender.
#[derive(Debug, Clone, Serialize)]
pub struct StaffingRow {
    pub runner_count: u32,
    pub aggregate: Aggregate,
    pub score: f64,
    pub on_frontier: bool,
    pub knee: bool,
    pub stable: bool,
}

/// Recommendation for one (scenario, order level).
#[derive(Debug, Clone, Serialize)]
pub struct StaffingRecommendation {
    pub scenario_id: String,
    pub order_level: u32,
    pub rows: Vec<StaffingRow>,
    /// `None` means "no viable staffing at this order level", reported
    /// explicitly rather than recommending an unstable count.
    pub recommended_runner_count: Option<u32>,
}

/// `s(r) = 0.3·on_time + 0.3·(1 − failed) + 0.2·(1 − p90/norm) + 0.2·(oprh/norm)`.
fn composite_score(aggregate: &Aggregate, p90_normalizer: f64, oprh_normalizer: f64) -> f64 {
    let p90_term = if p90_normalizer > 0.0 {
        (1.0 - aggregate.p90_delivery_cycle_s.mean / p90_normalizer).max(0.0)
    } else {
        0.0
    };
    let throughput_term = if oprh_normalizer > 0.0 {
        (aggregate.orders_per_runner_hour.mean / oprh_normalizer).min(1.0)
    } else {
        0.0
    };
    WEIGHT_ON_TIME * aggregate.on_time_rate.mean
        + WEIGHT_NOT_FAILED * (1.0 - aggregate.failed_rate.mean)
        + WEIGHT_P90 * p90_term
        + WEIGHT_THROUGHPUT * throughput_term
}

/// `a` dominates `b` on (on_time ↑, failed ↓, p90 ↓, oprh ↑): at least as
/// good on all four and strictly better on one.
fn dominates(a: &Aggregate, b: &Aggregate) -> bool {
    let at_least = a.on_time_rate.mean >= b.on_time_rate.mean
        && a.failed_rate.mean <= b.failed_rate.mean
        && a.p90_delivery_cycle_s.mean <= b.p90_delivery_cycle_s.mean
        && a.orders_per_runner_hour.mean >= b.orders_per_runner_hour.mean;
    let strictly = a.on_time_rate.mean > b.on_time_rate.mean
        || a.failed_rate.mean < b.failed_rate.mean
        || a.p90_delivery_cycle_s.mean < b.p90_delivery_cycle_s.mean
        || a.orders_per_runner_hour.mean > b.orders_per_runner_hour.mean;
    at_least && strictly
}

/// Knee: the frontier point (sorted by runner count) whose second
/// difference of the composite score is most negative. Needs at least
/// three frontier points and an actually-negative curvature.
fn knee_runner_count(frontier: &[(u32, f64)]) -> Option<u32> {
    if frontier.len() < 3 {
        return None;
    }
    let mut best: Option<(f64, u32)> = None;
    for window in frontier.windows(3) {
        let second_difference = window[2].1 - 2.0 * window[1].1 + window[0].1;
        if second_difference < 0.0 {
            let candidate = (second_difference, window[1].0);
            let better = match best {
                None => true,
                Some((best_d2, _)) => second_difference < best_d2,
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best.map(|(_, runner_count)| runner_count)
}

/// Evaluate staffing candidates for one (scenario, order level).
/// `candidates` pairs each runner count with its cross-run aggregate.
pub fn evaluate_staffing(
    scenario_id: &str,
    order_level: u32,
    candidates: &[(u32, Aggregate)],
) -> StaffingRecommendation {
    let mut sorted: Vec<&(u32, Aggregate)> = candidates.iter().collect();
    sorted.sort_by_key(|(runner_count, _)| *runner_count);

    let p90_normalizer = sorted
        .iter()
        .map(|(_, a)| a.p90_delivery_cycle_s.mean)
        .fold(0.0f64, f64::max)
        .max(1.0);
    let oprh_normalizer = sorted
        .iter()
        .map(|(_, a)| a.orders_per_runner_hour.mean)
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE);

    let mut rows: Vec<StaffingRow> = sorted
        .iter()
        .map(|(runner_count, aggregate)| StaffingRow {
            runner_count: *runner_count,
            aggregate: aggregate.clone(),
            score: composite_score(aggregate, p90_normalizer, oprh_normalizer),
            on_frontier: false,
            knee: false,
            stable: aggregate.stable,
        })
        .collect();

    let frontier_flags: Vec<bool> = (0..rows.len())
        .map(|index| {
            !rows.iter().enumerate().any(|(other, row)| {
                other != index && dominates(&row.aggregate, &rows[index].aggregate)
            })
        })
        .collect();
    for (row, on_frontier) in rows.iter_mut().zip(frontier_flags) {
        row.on_frontier = on_frontier;
    }

    let frontier: Vec<(u32, f64)> = rows
        .iter()
        .filter(|row| row.on_frontier)
        .map(|row| (row.runner_count, row.score))
        .collect();
    let knee = knee_runner_count(&frontier);
    if let Some(knee_count) = knee {
        for row in &mut rows {
            if row.runner_count == knee_count {
                row.knee = true;
            }
        }
    }

    let knee_is_stable = knee.and_then(|count| {
        rows.iter()
            .find(|row| row.runner_count == count && row.stable)
            .map(|row| row.runner_count)
    });
    let minimal_stable = rows
        .iter()
        .filter(|row| row.stable)
        .map(|row| row.runner_count)
        .min();
    let recommended_runner_count = knee_is_stable.or(minimal_stable);

    StaffingRecommendation {
        scenario_id: scenario_id.to_owned(),
        order_level,
        rows,
        recommended_runner_count,
    }
}

/// Aggregate and evaluate a whole sweep, one recommendation per
/// (scenario, order level). Combinations whose runs went missing are
/// skipped, never partially aggregated.
pub fn evaluate_sweep(
    outcomes: &[CombinationOutcome],
    targets: &ServiceTargets,
) -> Vec<StaffingRecommendation> {
    let mut by_level: Vec<(String, u32, Vec<(u32, Aggregate)>)> = Vec::new();
    for outcome in outcomes {
        let Ok(runs) = &outcome.runs else {
            continue;
        };
        let aggregate = aggregate_runs(runs, targets);
        match by_level
            .iter_mut()
            .find(|(scenario, level, _)| *scenario == outcome.scenario_id && *level == outcome.order_level)
        {
            Some((_, _, candidates)) => candidates.push((outcome.runner_count, aggregate)),
            None => by_level.push((
                outcome.scenario_id.clone(),
                outcome.order_level,
                vec![(outcome.runner_count, aggregate)],
            )),
        }
    }

    by_level
        .into_iter()
        .map(|(scenario_id, order_level, candidates)| {
            evaluate_staffing(&scenario_id, order_level, &candidates)
        })
        .collect()
}

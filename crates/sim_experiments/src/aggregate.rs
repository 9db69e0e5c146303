//! Cross-run aggregation: per-KPI mean and standard deviation, pooled
//! Wilson score bounds, and the stability gate used by the recommender.

use serde::Serialize;
use sim_core::metrics::RunMetrics;

/// 95% two-sided z.
const Z_95: f64 = 1.96;

/// Mean and sample standard deviation of one KPI across repetitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiStats {
    pub mean: f64,
    pub std: f64,
}

pub fn kpi_stats(values: &[f64]) -> KpiStats {
    if values.is_empty() {
        return KpiStats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() < 2 {
        0.0
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    };
    KpiStats { mean, std }
}

/// Wilson score interval for a binomial proportion. Robust at small n and
/// extreme proportions, which is exactly the small-repetition regime here.
pub fn wilson_bounds(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let center = p + z2 / (2.0 * n);
    let margin = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    (
        ((center - margin) / denominator).max(0.0),
        ((center + margin) / denominator).min(1.0),
    )
}

/// Service-level targets gating the staffing decision.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceTargets {
    pub target_on_time: f64,
    pub max_failed_rate: f64,
    pub max_p90_s: f64,
}

impl Default for ServiceTargets {
    fn default() -> Self {
        Self {
            target_on_time: 0.9,
            max_failed_rate: 0.05,
            max_p90_s: 1800.0,
        }
    }
}

/// Aggregated view of one configuration across repetitions.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub runs: usize,
    pub orders_total: usize,
    pub delivered_total: usize,
    pub on_time_total: usize,
    pub failed_total: usize,
    pub pending_total: usize,
    pub on_time_rate: KpiStats,
    pub failed_rate: KpiStats,
    pub p90_delivery_cycle_s: KpiStats,
    pub orders_per_runner_hour: KpiStats,
    pub runner_utilization: KpiStats,
    pub revenue: KpiStats,
    /// Wilson 95% lower bound on the pooled on-time proportion; the
    /// decision statistic.
    pub wilson_on_time_lo: f64,
    /// Wilson 95% upper bound on the pooled failure proportion.
    pub failed_rate_hi: f64,
    /// Normal-approximation upper bound on mean p90.
    pub p90_hi: f64,
    /// `wilson_lo >= target && failed_hi <= max && p90_hi <= max`.
    pub stable: bool,
}

fn collect<F: Fn(&RunMetrics) -> Option<f64>>(runs: &[RunMetrics], f: F) -> Vec<f64> {
    runs.iter().filter_map(|r| f(r)).collect()
}

pub fn aggregate_runs(runs: &[RunMetrics], targets: &ServiceTargets) -> Aggregate {
    let orders_total: usize = runs.iter().map(|r| r.total_orders).sum();
    let delivered_total: usize = runs.iter().map(|r| r.delivered).sum();
    let on_time_total: usize = runs.iter().map(|r| r.on_time_delivered).sum();
    let failed_total: usize = runs.iter().map(|r| r.failed).sum();
    let pending_total: usize = runs.iter().map(|r| r.pending).sum();

    let on_time_rate = kpi_stats(&collect(runs, |r| r.on_time_rate));
    let failed_rate = kpi_stats(&collect(runs, |r| r.failed_rate));
    let p90 = kpi_stats(&collect(runs, |r| r.p90_delivery_cycle_s));
    let orders_per_runner_hour = kpi_stats(&collect(runs, |r| r.orders_per_runner_hour));
    let runner_utilization = kpi_stats(&collect(runs, |r| Some(r.runner_utilization)));
    let revenue = kpi_stats(&collect(runs, |r| Some(r.revenue)));

    let (wilson_on_time_lo, _) = wilson_bounds(on_time_total, delivered_total, Z_95);
    let (_, failed_rate_hi) = wilson_bounds(failed_total, orders_total, Z_95);
    let p90_runs = collect(runs, |r| r.p90_delivery_cycle_s);
    let p90_hi = if p90_runs.is_empty() {
        0.0
    } else {
        p90.mean + Z_95 * p90.std / (p90_runs.len() as f64).sqrt()
    };

    let stable = delivered_total > 0
        && wilson_on_time_lo >= targets.target_on_time
        && failed_rate_hi <= targets.max_failed_rate
        && p90_hi <= targets.max_p90_s;

    Aggregate {
        runs: runs.len(),
        orders_total,
        delivered_total,
        on_time_total,
        failed_total,
        pending_total,
        on_time_rate,
        failed_rate,
        p90_delivery_cycle_s: p90,
        orders_per_runner_hour,
        runner_utilization,
        revenue,
        wilson_on_time_lo,
        failed_rate_hi,
        p90_hi,
        stable,
    }
}

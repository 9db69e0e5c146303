//! Per-run KPIs and the `RunResult` record returned by
//! [`crate::runner::run_simulation`].
//!
//! On-time rate is computed over delivered orders only; failed and pending
//! orders are excluded from the denominator. Revenue is
//! `delivered x avg_order_value`. Utilisation uses the shift duration as
//! its primary basis, with an active-hours basis emitted alongside.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, World};
use serde::Serialize;

use crate::clock::SimulationClock;
use crate::ecs::{
    ActivityKind, ActivityLog, ActivitySpan, FailureReason, Order, OrderStatus, OrderTiming,
    Runner,
};
use crate::scenario::SimulationConfig;
use crate::telemetry::{CoordinateRecord, DeliveryEvent, SimTelemetry};

const BUSY_KINDS: [ActivityKind; 3] = [
    ActivityKind::DrivingOut,
    ActivityKind::Handoff,
    ActivityKind::DrivingBack,
];
const ACTIVE_KINDS: [ActivityKind; 4] = [
    ActivityKind::Prepping,
    ActivityKind::DrivingOut,
    ActivityKind::Handoff,
    ActivityKind::DrivingBack,
];

/// Full lifecycle of one order, as written to `results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub group_id: u32,
    pub placed_s: u64,
    pub hole_at_placement: u8,
    pub status: OrderStatus,
    pub failure_reason: Option<FailureReason>,
    pub assigned_runner_id: Option<u32>,
    pub predicted_meeting_node: Option<u32>,
    pub predicted_meeting_s: Option<u64>,
    pub actual_meeting_s: Option<u64>,
    pub delivery_cycle_s: Option<u64>,
    pub total_cycle_s: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerRecord {
    pub runner_id: u32,
    pub activity: Vec<ActivitySpan>,
}

/// Aggregated KPIs of a single run. Ratios that are undefined for the run
/// (no deliveries, no orders, no active time) are `None` and serialise as
/// null rather than a fake zero.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub total_orders: usize,
    pub delivered: usize,
    pub on_time_delivered: usize,
    pub failed: usize,
    pub pending: usize,
    pub on_time_rate: Option<f64>,
    pub failed_rate: Option<f64>,
    pub p50_delivery_cycle_s: Option<f64>,
    pub p90_delivery_cycle_s: Option<f64>,
    pub orders_per_runner_hour: Option<f64>,
    /// Busy time (driving out, handoff, driving back) over the shift.
    pub runner_utilization: f64,
    /// Secondary basis: busy time over all non-idle time.
    pub active_hours_utilization: f64,
    pub revenue: f64,
}

/// Everything a single run produces: configuration snapshot, per-order
/// lifecycles, runner activity, KPIs, and the raw telemetry consumed by
/// the file writers (not serialised into `results.json` itself).
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub config: SimulationConfig,
    pub orders: Vec<OrderRecord>,
    pub runners: Vec<RunnerRecord>,
    pub metrics: RunMetrics,
    /// Orders the generator could not place anywhere (usually 0).
    pub shortfall: usize,
    pub steps_executed: usize,
    #[serde(skip)]
    pub events: Vec<DeliveryEvent>,
    #[serde(skip)]
    pub coordinates: Vec<CoordinateRecord>,
}

/// Percentile by the sorted-index rule `floor(q * (n - 1))`.
fn percentile(sorted: &[u64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((sorted.len() - 1) as f64 * q) as usize;
    Some(sorted[index.min(sorted.len() - 1)] as f64)
}

pub fn compute_metrics(
    config: &SimulationConfig,
    orders: &[OrderRecord],
    runners: &[RunnerRecord],
) -> RunMetrics {
    let total_orders = orders.len();
    let delivered_orders: Vec<&OrderRecord> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .collect();
    let delivered = delivered_orders.len();
    let failed = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Failed)
        .count();
    let pending = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();

    let on_time_delivered = delivered_orders
        .iter()
        .filter(|o| o.delivery_cycle_s.is_some_and(|c| c <= config.sla_s))
        .count();

    let mut cycles: Vec<u64> = delivered_orders
        .iter()
        .filter_map(|o| o.delivery_cycle_s)
        .collect();
    cycles.sort_unstable();

    let span_total = |record: &RunnerRecord, kinds: &[ActivityKind]| -> u64 {
        record
            .activity
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .map(|s| s.end_s - s.start_s)
            .sum()
    };
    let busy_s: u64 = runners.iter().map(|r| span_total(r, &BUSY_KINDS)).sum();
    let active_s: u64 = runners.iter().map(|r| span_total(r, &ACTIVE_KINDS)).sum();

    let shift_total_s = config.shift_duration_s().saturating_mul(runners.len() as u64);
    let runner_utilization = if shift_total_s > 0 {
        busy_s as f64 / shift_total_s as f64
    } else {
        0.0
    };
    let active_hours_utilization = if active_s > 0 {
        busy_s as f64 / active_s as f64
    } else {
        0.0
    };
    let active_hours = active_s as f64 / 3600.0;
    let orders_per_runner_hour = if active_hours > 0.0 {
        Some(delivered as f64 / active_hours)
    } else {
        None
    };

    RunMetrics {
        total_orders,
        delivered,
        on_time_delivered,
        failed,
        pending,
        on_time_rate: (delivered > 0).then(|| on_time_delivered as f64 / delivered as f64),
        failed_rate: (total_orders > 0).then(|| failed as f64 / total_orders as f64),
        p50_delivery_cycle_s: percentile(&cycles, 0.5),
        p90_delivery_cycle_s: percentile(&cycles, 0.9),
        orders_per_runner_hour,
        runner_utilization,
        active_hours_utilization,
        revenue: delivered as f64 * config.avg_order_value,
    }
}

/// Drain a finished world into a `RunResult`. Closes runner activity logs
/// at the final clock time and takes the telemetry out of the world.
pub fn collect_run_result(world: &mut World, shortfall: usize, steps_executed: usize) -> RunResult {
    let config = world.resource::<SimulationConfig>().clone();
    let final_ts = world.resource::<SimulationClock>().now();

    let runner_ids: HashMap<Entity, u32> = world
        .query::<(Entity, &Runner)>()
        .iter(world)
        .map(|(entity, runner)| (entity, runner.runner_id))
        .collect();

    let mut runner_records = Vec::new();
    {
        let mut query = world.query::<(&Runner, &mut ActivityLog)>();
        for (runner, mut log) in query.iter_mut(world) {
            log.close(final_ts);
            runner_records.push(RunnerRecord {
                runner_id: runner.runner_id,
                activity: log.spans().to_vec(),
            });
        }
    }
    runner_records.sort_by_key(|r| r.runner_id);

    let mut orders: Vec<OrderRecord> = world
        .query::<(&Order, &OrderTiming)>()
        .iter(world)
        .map(|(order, timing)| OrderRecord {
            order_id: order.order_id.clone(),
            group_id: order.group_id,
            placed_s: order.placed_s,
            hole_at_placement: order.hole_at_placement,
            status: order.status,
            failure_reason: order.failure,
            assigned_runner_id: order
                .assigned_runner
                .and_then(|entity| runner_ids.get(&entity).copied()),
            predicted_meeting_node: order.predicted_meeting_node,
            predicted_meeting_s: order.predicted_meeting_s,
            actual_meeting_s: timing.actual_meeting_s,
            delivery_cycle_s: timing.delivery_cycle_s(order.placed_s),
            total_cycle_s: timing.total_cycle_s(order.placed_s),
        })
        .collect();
    orders.sort_by(|a, b| a.order_id.cmp(&b.order_id));

    let metrics = compute_metrics(&config, &orders, &runner_records);
    let telemetry = world.remove_resource::<SimTelemetry>().unwrap_or_default();
    let coordinates = telemetry.sorted_coordinates();

    RunResult {
        config,
        orders,
        runners: runner_records,
        metrics,
        shortfall,
        steps_executed,
        events: telemetry.events,
        coordinates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::base_config;

    fn order(id: &str, status: OrderStatus, cycle: Option<u64>) -> OrderRecord {
        OrderRecord {
            order_id: id.to_owned(),
            group_id: 1,
            placed_s: 0,
            hole_at_placement: 1,
            status,
            failure_reason: None,
            assigned_runner_id: None,
            predicted_meeting_node: None,
            predicted_meeting_s: None,
            actual_meeting_s: cycle,
            delivery_cycle_s: cycle,
            total_cycle_s: None,
        }
    }

    fn runner_with(busy: &[(u64, u64, ActivityKind)]) -> RunnerRecord {
        RunnerRecord {
            runner_id: 0,
            activity: busy
                .iter()
                .map(|(start_s, end_s, kind)| ActivitySpan {
                    start_s: *start_s,
                    end_s: *end_s,
                    kind: *kind,
                })
                .collect(),
        }
    }

    #[test]
    fn status_accounting_sums_to_total() {
        let config = base_config();
        let orders = vec![
            order("order-0001", OrderStatus::Delivered, Some(900)),
            order("order-0002", OrderStatus::Delivered, Some(2500)),
            order("order-0003", OrderStatus::Failed, None),
            order("order-0004", OrderStatus::Pending, None),
        ];
        let metrics = compute_metrics(&config, &orders, &[]);
        assert_eq!(metrics.total_orders, 4);
        assert_eq!(
            metrics.delivered + metrics.failed + metrics.pending,
            metrics.total_orders
        );
        assert_eq!(metrics.on_time_rate, Some(0.5));
        assert_eq!(metrics.failed_rate, Some(0.25));
        assert_eq!(metrics.revenue, 2.0 * config.avg_order_value);
    }

    #[test]
    fn empty_run_reports_null_ratios() {
        let config = base_config();
        let metrics = compute_metrics(&config, &[], &[]);
        assert_eq!(metrics.on_time_rate, None);
        assert_eq!(metrics.failed_rate, None);
        assert_eq!(metrics.p50_delivery_cycle_s, None);
        assert_eq!(metrics.p90_delivery_cycle_s, None);
        assert_eq!(metrics.orders_per_runner_hour, None);
        assert_eq!(metrics.runner_utilization, 0.0);
        assert_eq!(metrics.revenue, 0.0);
    }

    #[test]
    fn utilisation_uses_shift_and_active_bases() {
        let config = base_config();
        let runners = vec![runner_with(&[
            (0, 600, ActivityKind::Prepping),
            (600, 900, ActivityKind::DrivingOut),
            (900, 960, ActivityKind::Handoff),
            (960, 1260, ActivityKind::DrivingBack),
            (1260, 25200, ActivityKind::Idle),
        ])];
        let orders = vec![order("order-0001", OrderStatus::Delivered, Some(900))];
        let metrics = compute_metrics(&config, &orders, &runners);

        let busy = 300.0 + 60.0 + 300.0;
        assert!((metrics.runner_utilization - busy / 25_200.0).abs() < 1e-12);
        assert!((metrics.active_hours_utilization - busy / (busy + 600.0)).abs() < 1e-12);
        let active_hours = (busy + 600.0) / 3600.0;
        assert!(
            (metrics.orders_per_runner_hour.expect("oprh") - 1.0 / active_hours).abs() < 1e-12
        );
    }

    #[test]
    fn percentiles_follow_the_sorted_index_rule() {
        let sorted: Vec<u64> = (1..=10).map(|i| i * 10).collect();
        assert_eq!(percentile(&sorted, 0.5), Some(50.0));
        assert_eq!(percentile(&sorted, 0.9), Some(90.0));
        assert_eq!(percentile(&[], 0.9), None);
    }
}

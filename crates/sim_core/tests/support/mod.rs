//! Shared helpers for the integration suites.
#![allow(dead_code)]

use sim_core::course::Course;
use sim_core::ecs::OrderStatus;
use sim_core::generator::{GeneratedOrder, GeneratedOrders};
use sim_core::metrics::RunResult;
use sim_core::scenario::TeeTime;

pub fn count_status(result: &RunResult, status: OrderStatus) -> usize {
    result.orders.iter().filter(|o| o.status == status).count()
}

/// `total = delivered + failed + pending` must hold in every finished run.
pub fn assert_status_accounting(result: &RunResult) {
    let delivered = count_status(result, OrderStatus::Delivered);
    let failed = count_status(result, OrderStatus::Failed);
    let pending = count_status(result, OrderStatus::Pending);
    assert_eq!(
        delivered + failed + pending,
        result.orders.len(),
        "orders must finish delivered, failed, or pending"
    );
    assert_eq!(result.metrics.delivered, delivered);
    assert_eq!(result.metrics.failed, failed);
    assert_eq!(result.metrics.pending, pending);
}

/// Build an explicit order list at fixed placement times. Each order picks
/// the group whose round covers the time near `target_elapsed_s`, so the
/// placements are fully deterministic.
pub fn hand_placed_orders(
    course: &Course,
    tee_sheet: &[TeeTime],
    times: &[u64],
    target_elapsed_s: u64,
) -> GeneratedOrders {
    let orders = times
        .iter()
        .enumerate()
        .map(|(index, placed_s)| {
            let slot = tee_sheet
                .iter()
                .map(|t| t.tee_time_s)
                .max()
                .unwrap_or(0)
                .min(placed_s.saturating_sub(target_elapsed_s));
            let tee = tee_sheet
                .iter()
                .min_by_key(|t| t.tee_time_s.abs_diff(slot))
                .expect("non-empty tee sheet");
            GeneratedOrder {
                order_id: format!("order-{:04}", index + 1),
                group_id: tee.group_id,
                tee_time_s: tee.tee_time_s,
                placed_s: *placed_s,
                hole_at_placement: course.group_hole_at(tee.tee_time_s, *placed_s),
            }
        })
        .collect();
    GeneratedOrders {
        orders,
        shortfall: 0,
    }
}

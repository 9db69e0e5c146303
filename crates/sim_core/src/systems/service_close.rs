//! Close-of-service sweep at `service_close + grace`: orders still queued
//! become pending (reported distinctly from failures), unless there was
//! never a runner to take them.

use bevy_ecs::prelude::{Query, Res, ResMut};
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::dispatch::{fail_order, DispatchQueue};
use crate::ecs::{FailureReason, Order, OrderStatus, Runner};
use crate::telemetry::{DeliveryEventKind, SimTelemetry};

pub fn service_close_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    mut queue: ResMut<DispatchQueue>,
    mut orders: Query<&mut Order>,
    runners: Query<&Runner>,
) {
    if event.0.kind != EventKind::ServiceClose {
        return;
    }
    let now = clock.now();
    let roster_empty = runners.iter().next().is_none();

    for order_entity in queue.drain_all() {
        let Ok(mut order) = orders.get_mut(order_entity) else {
            continue;
        };
        if order.status != OrderStatus::Queued {
            continue;
        }
        if roster_empty {
            fail_order(&mut telemetry, now, &mut order, FailureReason::NoRunner);
        } else {
            order.status = OrderStatus::Pending;
            telemetry.event(
                now,
                DeliveryEventKind::OrderPending,
                Some(&order.order_id),
                None,
                Some(order.hole_at_placement),
                json!({}),
            );
        }
    }
}

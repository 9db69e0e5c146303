//! Arrival at the meeting node: the order is delivered and the snapped
//! golfer/runner coordinate pair is emitted: two rows, identical
//! timestamp and position, one per actor.

use bevy_ecs::prelude::{Query, Res, ResMut};
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::CourseResource;
use crate::ecs::{ActivityKind, ActivityLog, Order, OrderStatus, OrderTiming, Runner, RunnerState};
use crate::scenario::SimulationConfig;
use crate::telemetry::{ActorKind, CoordinateRecord, DeliveryEventKind, SimTelemetry};

#[allow(clippy::too_many_arguments)]
pub fn arrive_at_meeting_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    config: Res<SimulationConfig>,
    course: Res<CourseResource>,
    mut runners: Query<(&mut Runner, &mut ActivityLog)>,
    mut orders: Query<(&mut Order, &mut OrderTiming)>,
) {
    if event.0.kind != EventKind::ArriveAtMeeting {
        return;
    }
    let Some(EventSubject::Runner(runner_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut runner, mut activity)) = runners.get_mut(runner_entity) else {
        return;
    };
    if runner.state != RunnerState::DrivingOut {
        return;
    }
    let Some(order_entity) = runner.current_order else {
        return;
    };
    let Ok((mut order, mut timing)) = orders.get_mut(order_entity) else {
        return;
    };
    let Some(meeting_node) = order.predicted_meeting_node else {
        return;
    };
    let Some((lat, lon)) = course.0.node_latlon(meeting_node) else {
        return;
    };
    let now = clock.now();

    runner.position = meeting_node;
    runner.state = RunnerState::Handoff;
    activity.begin(now, ActivityKind::Handoff);

    order.status = OrderStatus::Delivered;
    timing.actual_meeting_s = Some(now);

    let hole = course.0.group_hole_at(order.tee_time_s, now);
    telemetry.coordinates.push(CoordinateRecord {
        ts_s: now,
        actor_id: format!("golfer-{}", order.group_id),
        actor_kind: ActorKind::Golfer,
        lat,
        lon,
        hole: Some(hole),
        is_delivery_event: true,
        order_id: Some(order.order_id.clone()),
    });
    telemetry.coordinates.push(CoordinateRecord {
        ts_s: now,
        actor_id: format!("runner-{}", runner.runner_id),
        actor_kind: ActorKind::Runner,
        lat,
        lon,
        hole: Some(hole),
        is_delivery_event: true,
        order_id: Some(order.order_id.clone()),
    });

    telemetry.event(
        now,
        DeliveryEventKind::Delivered,
        Some(&order.order_id),
        Some(runner.runner_id),
        Some(hole),
        json!({
            "meeting_node": meeting_node,
            "delivery_cycle_s": now.saturating_sub(order.placed_s),
        }),
    );

    clock.schedule_in(
        config.handoff_s,
        EventKind::HandoffComplete,
        Some(EventSubject::Runner(runner_entity)),
    );
}

//! Prep completion: the runner departs, the outbound track is emitted, and
//! the arrival is scheduled at the predicted meeting time.
//!
//! The outbound track is time-scaled over `[departure, meeting]`, so the
//! emitted coordinates land on the meeting exactly even when the meeting
//! was prep-bound rather than drive-bound.

use bevy_ecs::prelude::{Query, Res, ResMut};
use log::warn;
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::CourseResource;
use crate::dispatch::fail_order;
use crate::ecs::{ActivityKind, ActivityLog, FailureReason, Order, OrderStatus, OrderTiming, Runner, RunnerState};
use crate::routing::{emit_path_coordinates, RoutePlanner};
use crate::telemetry::{ActorKind, CoordinateRecord, DeliveryEventKind, SimTelemetry};

#[allow(clippy::too_many_arguments)]
pub fn prep_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    course: Res<CourseResource>,
    planner: Res<RoutePlanner>,
    mut runners: Query<(&mut Runner, &mut ActivityLog)>,
    mut orders: Query<(&mut Order, &mut OrderTiming)>,
) {
    if event.0.kind != EventKind::PrepComplete {
        return;
    }
    let Some(EventSubject::Runner(runner_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut runner, mut activity)) = runners.get_mut(runner_entity) else {
        return;
    };
    if runner.state != RunnerState::Prepping {
        return;
    }
    let Some(order_entity) = runner.current_order else {
        return;
    };
    let Ok((mut order, mut timing)) = orders.get_mut(order_entity) else {
        return;
    };
    let now = clock.now();
    timing.prep_done_s = Some(now);

    let (Some(meeting_node), Some(meeting_s)) =
        (order.predicted_meeting_node, order.predicted_meeting_s)
    else {
        return;
    };

    telemetry.event(
        now,
        DeliveryEventKind::PrepComplete,
        Some(&order.order_id),
        Some(runner.runner_id),
        None,
        json!({}),
    );

    let Some(plan) = planner.route(runner.position, meeting_node) else {
        // Validated routable at prediction time, so this is defensive:
        // fail the order and send the runner straight back to idle.
        warn!(
            "outbound route vanished for {} (node {meeting_node}); failing order",
            order.order_id
        );
        fail_order(&mut telemetry, now, &mut order, FailureReason::Unroutable);
        runner.current_order = None;
        runner.state = RunnerState::DrivingBack;
        activity.begin(now, ActivityKind::DrivingBack);
        clock.schedule_at(now, EventKind::ReturnComplete, Some(EventSubject::Runner(runner_entity)));
        return;
    };

    order.status = OrderStatus::InTransit;
    runner.state = RunnerState::DrivingOut;
    activity.begin(now, ActivityKind::DrivingOut);

    // Everything but the final point: the arrival handler emits the snapped
    // delivery pair at the meeting itself.
    let actor_id = format!("runner-{}", runner.runner_id);
    let points = emit_path_coordinates(&course.0, &plan, now, meeting_s);
    for point in points.iter().take(points.len().saturating_sub(1)) {
        telemetry.coordinates.push(CoordinateRecord {
            ts_s: point.ts_s,
            actor_id: actor_id.clone(),
            actor_kind: ActorKind::Runner,
            lat: point.lat,
            lon: point.lon,
            hole: None,
            is_delivery_event: false,
            order_id: None,
        });
    }

    clock.schedule_at(
        meeting_s,
        EventKind::ArriveAtMeeting,
        Some(EventSubject::Runner(runner_entity)),
    );
}

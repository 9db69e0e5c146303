//! Handoff completion: the runner turns around and drives the shortest
//! path back to the clubhouse at physical speed.
//!
//! Routing stays strictly on the graph: if the return route does not
//! exist, the order fails with an explicit reason; no substitute travel
//! time is ever synthesized.

use bevy_ecs::prelude::{Query, Res, ResMut};
use log::warn;
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::CourseResource;
use crate::dispatch::fail_order;
use crate::ecs::{ActivityKind, ActivityLog, FailureReason, Order, Runner, RunnerState};
use crate::routing::{emit_path_coordinates, travel_time_s, RoutePlanner};
use crate::scenario::SimulationConfig;
use crate::telemetry::{ActorKind, CoordinateRecord, DeliveryEventKind, SimTelemetry};

#[allow(clippy::too_many_arguments)]
pub fn handoff_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    config: Res<SimulationConfig>,
    course: Res<CourseResource>,
    planner: Res<RoutePlanner>,
    mut runners: Query<(&mut Runner, &mut ActivityLog)>,
    mut orders: Query<&mut Order>,
) {
    if event.0.kind != EventKind::HandoffComplete {
        return;
    }
    let Some(EventSubject::Runner(runner_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut runner, mut activity)) = runners.get_mut(runner_entity) else {
        return;
    };
    if runner.state != RunnerState::Handoff {
        return;
    }
    let now = clock.now();
    let order_id = runner
        .current_order
        .and_then(|entity| orders.get(entity).ok())
        .map(|order| order.order_id.clone());

    runner.state = RunnerState::DrivingBack;
    activity.begin(now, ActivityKind::DrivingBack);
    telemetry.event(
        now,
        DeliveryEventKind::HandoffComplete,
        order_id.as_deref(),
        Some(runner.runner_id),
        None,
        json!({}),
    );

    let clubhouse = course.0.clubhouse;
    let Some(plan) = planner.route(runner.position, clubhouse) else {
        // The graph is undirected, so a reachable meeting node always
        // routes back; if the route is gone anyway, the order cannot
        // complete its cycle. Fail it and send the runner straight back
        // to idle; never invent a return time.
        warn!(
            "no return route from node {}; failing {}",
            runner.position,
            order_id.as_deref().unwrap_or("<no order>")
        );
        if let Some(order_entity) = runner.current_order.take() {
            if let Ok(mut order) = orders.get_mut(order_entity) {
                fail_order(&mut telemetry, now, &mut order, FailureReason::Unroutable);
            }
        }
        clock.schedule_at(
            now,
            EventKind::ReturnComplete,
            Some(EventSubject::Runner(runner_entity)),
        );
        return;
    };

    let travel = travel_time_s(plan.length_m, config.runner_speed_m_s);
    let return_s = now + travel;
    let actor_id = format!("runner-{}", runner.runner_id);
    for point in emit_path_coordinates(&course.0, &plan, now, return_s) {
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
        return_s,
        EventKind::ReturnComplete,
        Some(EventSubject::Runner(runner_entity)),
    );
}

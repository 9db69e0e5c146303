//! Order placement: assign to the best idle runner, or queue when the
//! whole roster is busy.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::{CourseResource, NodeId};
use crate::dispatch::{
    apply_assignment, choose_runner, fail_order, plan_assignment, AssignmentPlan, DispatchQueue,
};
use crate::ecs::{ActivityLog, FailureReason, Order, OrderTiming, Runner, RunnerState};
use crate::routing::RoutePlanner;
use crate::scenario::SimulationConfig;
use crate::telemetry::{DeliveryEventKind, SimTelemetry};

#[allow(clippy::too_many_arguments)]
pub fn order_placed_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    config: Res<SimulationConfig>,
    course: Res<CourseResource>,
    planner: Res<RoutePlanner>,
    mut queue: ResMut<DispatchQueue>,
    mut orders: Query<(&mut Order, &mut OrderTiming)>,
    mut runners: Query<(Entity, &mut Runner, &mut ActivityLog)>,
) {
    if event.0.kind != EventKind::OrderPlaced {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut order, mut timing)) = orders.get_mut(order_entity) else {
        return;
    };
    let now = clock.now();

    telemetry.event(
        now,
        DeliveryEventKind::OrderPlaced,
        Some(&order.order_id),
        None,
        Some(order.hole_at_placement),
        json!({ "group_id": order.group_id }),
    );

    let idle: Vec<(Entity, u32, NodeId)> = runners
        .iter()
        .filter(|(_, runner, _)| runner.state == RunnerState::Idle)
        .map(|(entity, runner, _)| (entity, runner.runner_id, runner.position))
        .collect();
    if idle.is_empty() {
        queue.push_back(order_entity);
        telemetry.event(
            now,
            DeliveryEventKind::OrderQueued,
            Some(&order.order_id),
            None,
            Some(order.hole_at_placement),
            json!({ "queue_len": queue.len() }),
        );
        return;
    }

    match plan_assignment(&course.0, &planner, &config, order.tee_time_s, now) {
        AssignmentPlan::Fail(reason) => fail_order(&mut telemetry, now, &mut order, reason),
        AssignmentPlan::Assign(prediction) => {
            let Some(runner_entity) = choose_runner(
                &planner,
                config.runner_speed_m_s,
                prediction.meeting_node,
                &idle,
            ) else {
                fail_order(&mut telemetry, now, &mut order, FailureReason::Unroutable);
                return;
            };
            let Ok((_, mut runner, mut activity)) = runners.get_mut(runner_entity) else {
                return;
            };
            apply_assignment(
                &mut clock,
                &mut telemetry,
                &config,
                order_entity,
                &mut order,
                &mut timing,
                runner_entity,
                &mut runner,
                &mut activity,
                prediction,
            );
        }
    }
}

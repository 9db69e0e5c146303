//! Runner return: close out the delivered order, go idle, and pop the head
//! of the pending queue with a fresh prediction.
//!
//! One pop per return. The popped order is re-predicted at `t0 = now`; a
//! stale head (meeting past close + grace) fails and the runner stays
//! idle; remaining queued orders resolve at the close sweep, reported as
//! pending rather than failed.

use bevy_ecs::prelude::{Query, Res, ResMut};
use serde_json::json;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::CourseResource;
use crate::dispatch::{
    apply_assignment, fail_order, plan_assignment, AssignmentPlan, DispatchQueue,
};
use crate::ecs::{ActivityKind, ActivityLog, Order, OrderStatus, OrderTiming, Runner, RunnerState};
use crate::routing::RoutePlanner;
use crate::scenario::SimulationConfig;
use crate::telemetry::{DeliveryEventKind, SimTelemetry};

#[allow(clippy::too_many_arguments)]
pub fn return_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut telemetry: ResMut<SimTelemetry>,
    config: Res<SimulationConfig>,
    course: Res<CourseResource>,
    planner: Res<RoutePlanner>,
    mut queue: ResMut<DispatchQueue>,
    mut runners: Query<(&mut Runner, &mut ActivityLog)>,
    mut orders: Query<(&mut Order, &mut OrderTiming)>,
) {
    if event.0.kind != EventKind::ReturnComplete {
        return;
    }
    let Some(EventSubject::Runner(runner_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut runner, mut activity)) = runners.get_mut(runner_entity) else {
        return;
    };
    if runner.state != RunnerState::DrivingBack {
        return;
    }
    let now = clock.now();

    runner.position = course.0.clubhouse;
    runner.state = RunnerState::Idle;
    activity.begin(now, ActivityKind::Idle);

    if let Some(order_entity) = runner.current_order.take() {
        if let Ok((order, mut timing)) = orders.get_mut(order_entity) {
            if order.status == OrderStatus::Delivered {
                timing.runner_return_s = Some(now);
                telemetry.event(
                    now,
                    DeliveryEventKind::RunnerReturned,
                    Some(&order.order_id),
                    Some(runner.runner_id),
                    None,
                    json!({ "total_cycle_s": now.saturating_sub(order.placed_s) }),
                );
            }
        }
    }

    let Some(next_entity) = queue.pop_front() else {
        return;
    };
    let Ok((mut order, mut timing)) = orders.get_mut(next_entity) else {
        return;
    };
    if order.status != OrderStatus::Queued {
        return;
    }
    match plan_assignment(&course.0, &planner, &config, order.tee_time_s, now) {
        AssignmentPlan::Fail(reason) => fail_order(&mut telemetry, now, &mut order, reason),
        AssignmentPlan::Assign(prediction) => apply_assignment(
            &mut clock,
            &mut telemetry,
            &config,
            next_entity,
            &mut order,
            &mut timing,
            runner_entity,
            &mut runner,
            &mut activity,
            prediction,
        ),
    }
}

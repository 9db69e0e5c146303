//! Dispatch: order-to-runner assignment and the FIFO pending queue.
//!
//! Assignment always re-runs the predictor at the current time, so a
//! queued order's stale prediction is refreshed at the moment a runner
//! frees up, never earlier.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};
use serde_json::json;

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::course::{Course, NodeId};
use crate::ecs::{ActivityKind, ActivityLog, FailureReason, Order, OrderStatus, OrderTiming, Runner, RunnerState};
use crate::predict::{predict_intercept, Prediction};
use crate::routing::RoutePlanner;
use crate::scenario::SimulationConfig;
use crate::telemetry::{DeliveryEventKind, SimTelemetry};

/// Orders waiting for a free runner, oldest first.
#[derive(Debug, Default, Resource)]
pub struct DispatchQueue {
    pending: VecDeque<Entity>,
}

impl DispatchQueue {
    pub fn push_back(&mut self, order: Entity) {
        self.pending.push_back(order);
    }

    pub fn pop_front(&mut self) -> Option<Entity> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return everything still queued (service-close sweep).
    pub fn drain_all(&mut self) -> Vec<Entity> {
        self.pending.drain(..).collect()
    }
}

/// What assignment decided for one order at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentPlan {
    Assign(Prediction),
    Fail(FailureReason),
}

/// Run the predictor for an order at `t0 = now` and gate the result
/// against the service window. Unroutable meeting nodes and predictions
/// past close + grace are per-order failures, fatal only for that order.
pub fn plan_assignment(
    course: &Course,
    planner: &RoutePlanner,
    config: &SimulationConfig,
    tee_time_s: u64,
    now: u64,
) -> AssignmentPlan {
    match predict_intercept(
        course,
        planner,
        tee_time_s,
        now,
        config.prep_time_s,
        config.runner_speed_m_s,
    ) {
        Err(_) => AssignmentPlan::Fail(FailureReason::Unroutable),
        Ok(prediction) if prediction.meeting_s > config.close_with_grace_s() => {
            AssignmentPlan::Fail(FailureReason::ServiceClosed)
        }
        Ok(prediction) => AssignmentPlan::Assign(prediction),
    }
}

/// Idle runner with the smallest drive to the meeting node; ties go to the
/// lowest runner id. Idle runners all sit at the clubhouse, so this
/// degenerates to the lowest id, but the rule holds if idling elsewhere
/// ever becomes legal.
pub fn choose_runner(
    planner: &RoutePlanner,
    speed_m_s: f64,
    meeting_node: NodeId,
    idle_runners: &[(Entity, u32, NodeId)],
) -> Option<Entity> {
    idle_runners
        .iter()
        .filter_map(|(entity, runner_id, position)| {
            planner
                .drive_time_s(*position, meeting_node, speed_m_s)
                .map(|drive_s| (drive_s, *runner_id, *entity))
        })
        .min_by_key(|(drive_s, runner_id, _)| (*drive_s, *runner_id))
        .map(|(_, _, entity)| entity)
}

/// Commit an assignment: mutate the order and the runner, open the prep
/// activity span, schedule `PrepComplete`, and log the event.
#[allow(clippy::too_many_arguments)]
pub fn apply_assignment(
    clock: &mut SimulationClock,
    telemetry: &mut SimTelemetry,
    config: &SimulationConfig,
    order_entity: Entity,
    order: &mut Order,
    timing: &mut OrderTiming,
    runner_entity: Entity,
    runner: &mut Runner,
    activity: &mut ActivityLog,
    prediction: Prediction,
) {
    let now = clock.now();
    order.status = OrderStatus::Prepping;
    order.assigned_runner = Some(runner_entity);
    order.predicted_meeting_node = Some(prediction.meeting_node);
    order.predicted_meeting_s = Some(prediction.meeting_s);
    timing.assigned_s = Some(now);

    runner.state = RunnerState::Prepping;
    runner.current_order = Some(order_entity);
    activity.begin(now, ActivityKind::Prepping);

    clock.schedule_in(
        config.prep_time_s,
        EventKind::PrepComplete,
        Some(EventSubject::Runner(runner_entity)),
    );
    telemetry.event(
        now,
        DeliveryEventKind::OrderAssigned,
        Some(&order.order_id),
        Some(runner.runner_id),
        Some(order.hole_at_placement),
        json!({
            "meeting_node": prediction.meeting_node,
            "meeting_s": prediction.meeting_s,
        }),
    );
}

/// Terminal failure for one order; the run continues.
pub fn fail_order(
    telemetry: &mut SimTelemetry,
    now: u64,
    order: &mut Order,
    reason: FailureReason,
) {
    order.status = OrderStatus::Failed;
    order.failure = Some(reason);
    telemetry.event(
        now,
        DeliveryEventKind::OrderFailed,
        Some(&order.order_id),
        None,
        Some(order.hole_at_placement),
        json!({ "reason": reason.as_str() }),
    );
}

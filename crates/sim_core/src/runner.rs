//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each
//! step pops the next event from [`SimulationClock`], inserts it as
//! [`CurrentEvent`], then runs the schedule. `run_simulation` is the
//! callable entry point wrapping build, run, and result collection.

use std::sync::Arc;

use bevy_ecs::prelude::{Res, Resource, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::course::Course;
use crate::error::SimError;
use crate::metrics::{collect_run_result, RunResult};
use crate::scenario::{build_scenario, SimulationConfig, TeeTime};
use crate::systems::{
    arrive_at_meeting::arrive_at_meeting_system,
    handoff_complete::handoff_complete_system,
    order_placed::order_placed_system,
    prep_complete::prep_complete_system,
    return_complete::return_complete_system,
    service_close::service_close_system,
    simulation_started::simulation_started_system,
};

/// Step budget for one run. A full day at high volume is a few thousand
/// events, so hitting this means a scheduling bug or a runaway loop.
pub const MAX_STEPS: usize = 2_000_000;

/// Simulation end time in seconds. When present, the runner stops before
/// popping an event at or past this timestamp.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub u64);

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_order_placed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OrderPlaced)
        .unwrap_or(false)
}

fn is_prep_complete(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::PrepComplete)
        .unwrap_or(false)
}

fn is_arrive_at_meeting(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ArriveAtMeeting)
        .unwrap_or(false)
}

fn is_handoff_complete(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::HandoffComplete)
        .unwrap_or(false)
}

fn is_return_complete(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ReturnComplete)
        .unwrap_or(false)
}

fn is_service_close(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ServiceClose)
        .unwrap_or(false)
}

/// Runs one simulation step: pops the next event, inserts it as
/// [`CurrentEvent`], then runs the schedule. Returns `false` when the
/// queue is empty or the next event is at or past [`SimulationEndTime`].
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let stop_at = world.get_resource::<SimulationEndTime>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end_s), Some(ts)) = (stop_at, next_ts) {
        if ts >= end_s {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs one simulation step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let stop_at = world.get_resource::<SimulationEndTime>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end_s), Some(ts)) = (stop_at, next_ts) {
        if ts >= end_s {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    hook(world, &event);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is
/// reached. Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the default simulation schedule: one system per event kind,
/// conditionally executed so only the handler for the current event runs.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        order_placed_system.run_if(is_order_placed),
        prep_complete_system.run_if(is_prep_complete),
        arrive_at_meeting_system.run_if(is_arrive_at_meeting),
        handoff_complete_system.run_if(is_handoff_complete),
        return_complete_system.run_if(is_return_complete),
        service_close_system.run_if(is_service_close),
    ));
    schedule
}

/// Initializes the simulation by scheduling the SimulationStarted event at
/// time 0. Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0, EventKind::SimulationStarted, None);
}

/// Run one full simulation: build the world from `config` and the tee
/// sheet, drain the event queue, and collect the results. Deterministic
/// given `(course, tee_sheet, config)`.
pub fn run_simulation(
    course: Arc<Course>,
    config: &SimulationConfig,
    tee_sheet: &[TeeTime],
) -> Result<RunResult, SimError> {
    let mut world = World::new();
    let generated = build_scenario(&mut world, course, config.clone(), tee_sheet)?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    Ok(collect_run_result(&mut world, generated.shortfall, steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_config, synthetic_course, tee_sheet};

    #[test]
    fn end_time_stops_the_loop_before_late_events() {
        let mut world = World::new();
        let course = synthetic_course();
        let config = base_config().with_total_orders(5);
        build_scenario(&mut world, course, config, &tee_sheet(5, 600)).expect("build");
        world.insert_resource(SimulationEndTime(1));
        initialize_simulation(&mut world);

        let mut schedule = simulation_schedule();
        // Only events at t = 0 run; everything later stays queued.
        let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
        assert!(steps >= 1);
        assert_eq!(world.resource::<SimulationClock>().now(), 0);
        assert!(world
            .resource::<SimulationClock>()
            .pending_event_count() > 0);
    }

    #[test]
    fn run_simulation_is_deterministic() {
        let course = synthetic_course();
        let config = base_config().with_total_orders(6);
        let sheet = tee_sheet(8, 900);

        let a = run_simulation(course.clone(), &config, &sheet).expect("run a");
        let b = run_simulation(course, &config, &sheet).expect("run b");

        assert_eq!(a.steps_executed, b.steps_executed);
        assert_eq!(a.orders.len(), b.orders.len());
        for (left, right) in a.orders.iter().zip(b.orders.iter()) {
            assert_eq!(left.order_id, right.order_id);
            assert_eq!(left.status, right.status);
            assert_eq!(left.actual_meeting_s, right.actual_meeting_s);
        }
        assert_eq!(a.events.len(), b.events.len());
        assert_eq!(a.coordinates.len(), b.coordinates.len());
    }
}

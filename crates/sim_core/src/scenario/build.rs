//! Scenario building: inserts every resource, spawns groups, orders, and
//! runners, and emits the deterministic golfer coordinate tracks.

use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::{Entity, World};
use log::warn;

use crate::clock::SimulationClock;
use crate::course::{Course, CourseResource};
use crate::dispatch::DispatchQueue;
use crate::ecs::{ActivityKind, ActivityLog, GolferGroup, Order, OrderStatus, OrderTiming, Runner, RunnerState};
use crate::error::SimError;
use crate::generator::{generate_orders, GeneratedOrders};
use crate::routing::RoutePlanner;
use crate::scenario::params::{SimulationConfig, TeeTime};
use crate::telemetry::{ActorKind, CoordinateRecord, SimTelemetry};

/// Generate orders and build the world for one run. Returns the generated
/// order list so callers can inspect the shortfall.
pub fn build_scenario(
    world: &mut World,
    course: Arc<Course>,
    config: SimulationConfig,
    tee_sheet: &[TeeTime],
) -> Result<GeneratedOrders, SimError> {
    let generated = generate_orders(&course, tee_sheet, &config)?;
    build_scenario_with_orders(world, course, config, tee_sheet, generated.clone())?;
    Ok(generated)
}

/// Build the world around an explicit order list (tests inject hand-built
/// orders through this entry point).
pub fn build_scenario_with_orders(
    world: &mut World,
    course: Arc<Course>,
    config: SimulationConfig,
    tee_sheet: &[TeeTime],
    generated: GeneratedOrders,
) -> Result<(), SimError> {
    config.validate()?;

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(DispatchQueue::default());
    world.insert_resource(RoutePlanner::new(course.clone()));

    let mut group_entities: HashMap<u32, Entity> = HashMap::new();
    for tee in tee_sheet {
        let tee_abs_s = config.service_open_s + tee.tee_time_s;
        let entity = world
            .spawn(GolferGroup {
                group_id: tee.group_id,
                tee_time_s: tee_abs_s,
                size: tee.size,
            })
            .id();
        group_entities.insert(tee.group_id, entity);
    }

    // Golfer tracks are fully determined by the tee sheet and the golfer
    // path, so they are emitted up front rather than event by event.
    {
        let mut telemetry = world.resource_mut::<SimTelemetry>();
        for tee in tee_sheet {
            let tee_abs_s = config.service_open_s + tee.tee_time_s;
            let actor_id = format!("golfer-{}", tee.group_id);
            let mut last_elapsed = None;
            for (index, sample) in course.golfer_path.samples().iter().enumerate() {
                if last_elapsed == Some(sample.elapsed_s) {
                    continue;
                }
                last_elapsed = Some(sample.elapsed_s);
                let Some((lat, lon)) = course.node_latlon(sample.node) else {
                    continue;
                };
                telemetry.coordinates.push(CoordinateRecord {
                    ts_s: tee_abs_s + sample.elapsed_s,
                    actor_id: actor_id.clone(),
                    actor_kind: ActorKind::Golfer,
                    lat,
                    lon,
                    hole: Some(course.hole_at_sample(index)),
                    is_delivery_event: false,
                    order_id: None,
                });
            }
        }
    }

    for generated_order in &generated.orders {
        let Some(group) = group_entities.get(&generated_order.group_id).copied() else {
            warn!(
                "generated order {} references unknown group {}; dropping it",
                generated_order.order_id, generated_order.group_id
            );
            continue;
        };
        world.spawn((
            Order {
                order_id: generated_order.order_id.clone(),
                group,
                group_id: generated_order.group_id,
                tee_time_s: generated_order.tee_time_s,
                placed_s: generated_order.placed_s,
                hole_at_placement: generated_order.hole_at_placement,
                status: OrderStatus::Queued,
                failure: None,
                assigned_runner: None,
                predicted_meeting_node: None,
                predicted_meeting_s: None,
            },
            OrderTiming::default(),
        ));
    }

    for runner_id in 0..config.runner_count {
        let mut activity = ActivityLog::default();
        activity.begin(config.service_open_s, ActivityKind::Idle);
        world.spawn((
            Runner {
                runner_id,
                state: RunnerState::Idle,
                position: course.clubhouse,
                current_order: None,
            },
            activity,
        ));
    }

    world.insert_resource(CourseResource(course));
    world.insert_resource(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_config, synthetic_course, tee_sheet};

    #[test]
    fn build_spawns_groups_orders_and_runners() {
        let mut world = World::new();
        let course = synthetic_course();
        let config = base_config().with_total_orders(8).with_runner_count(3);
        let sheet = tee_sheet(6, 900);

        let generated =
            build_scenario(&mut world, course, config, &sheet).expect("build scenario");
        assert_eq!(generated.orders.len(), 8);

        assert_eq!(world.query::<&GolferGroup>().iter(&world).count(), 6);
        assert_eq!(world.query::<&Order>().iter(&world).count(), 8);
        assert_eq!(world.query::<&Runner>().iter(&world).count(), 3);

        // Golfer tracks are present before any event runs.
        let telemetry = world.resource::<SimTelemetry>();
        assert!(!telemetry.coordinates.is_empty());
        assert!(telemetry
            .coordinates
            .iter()
            .all(|r| r.actor_kind == ActorKind::Golfer && !r.is_delivery_event));
    }

    #[test]
    fn invalid_config_never_builds() {
        let mut world = World::new();
        let course = synthetic_course();
        let config = base_config().with_blocked_holes(1..=18);
        let err = build_scenario(&mut world, course, config, &tee_sheet(4, 600));
        assert!(err.is_err());
    }
}

//! Opens the service day: schedules every generated order's placement and
//! the close-of-service sweep.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::Order;
use crate::scenario::SimulationConfig;

pub fn simulation_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    config: Res<SimulationConfig>,
    orders: Query<(Entity, &Order)>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }

    // Same-second placements must fire in order-id order, so sort before
    // scheduling: the clock breaks timestamp ties by insertion.
    let mut placements: Vec<(u64, String, Entity)> = orders
        .iter()
        .map(|(entity, order)| (order.placed_s, order.order_id.clone(), entity))
        .collect();
    placements.sort();
    for (placed_s, _, entity) in placements {
        clock.schedule_at(placed_s, EventKind::OrderPlaced, Some(EventSubject::Order(entity)));
    }

    clock.schedule_at(config.close_with_grace_s(), EventKind::ServiceClose, None);
}

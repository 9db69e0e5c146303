//! Telemetry: the append-only delivery-event log and the unified
//! coordinate stream, collected as a resource and flushed by the writers
//! in [`crate::telemetry_export`].

use bevy_ecs::prelude::Resource;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryEventKind {
    OrderPlaced,
    OrderQueued,
    OrderAssigned,
    PrepComplete,
    Delivered,
    HandoffComplete,
    RunnerReturned,
    OrderFailed,
    OrderPending,
}

impl DeliveryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryEventKind::OrderPlaced => "order_placed",
            DeliveryEventKind::OrderQueued => "order_queued",
            DeliveryEventKind::OrderAssigned => "order_assigned",
            DeliveryEventKind::PrepComplete => "prep_complete",
            DeliveryEventKind::Delivered => "delivered",
            DeliveryEventKind::HandoffComplete => "handoff_complete",
            DeliveryEventKind::RunnerReturned => "runner_returned",
            DeliveryEventKind::OrderFailed => "order_failed",
            DeliveryEventKind::OrderPending => "order_pending",
        }
    }
}

/// One row of the append-only event log.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryEvent {
    pub ts_s: u64,
    pub kind: DeliveryEventKind,
    pub order_id: Option<String>,
    pub runner_id: Option<u32>,
    pub hole: Option<u8>,
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Golfer,
    Runner,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Golfer => "golfer",
            ActorKind::Runner => "runner",
        }
    }

    fn sort_code(&self) -> u8 {
        match self {
            ActorKind::Golfer => 0,
            ActorKind::Runner => 1,
        }
    }
}

/// One row of the unified coordinate stream. For every delivered order
/// exactly two rows carry `is_delivery_event = true` (one golfer, one
/// runner) with identical timestamp and coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateRecord {
    pub ts_s: u64,
    pub actor_id: String,
    pub actor_kind: ActorKind,
    pub lat: f64,
    pub lon: f64,
    pub hole: Option<u8>,
    pub is_delivery_event: bool,
    pub order_id: Option<String>,
}

/// Collected simulation telemetry. Events append in handler order, which
/// combined with the clock's insertion-ordered ties makes the log (and
/// every file derived from it) reproducible byte for byte.
#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub events: Vec<DeliveryEvent>,
    pub coordinates: Vec<CoordinateRecord>,
}

impl SimTelemetry {
    pub fn event(
        &mut self,
        ts_s: u64,
        kind: DeliveryEventKind,
        order_id: Option<&str>,
        runner_id: Option<u32>,
        hole: Option<u8>,
        extra: serde_json::Value,
    ) {
        self.events.push(DeliveryEvent {
            ts_s,
            kind,
            order_id: order_id.map(str::to_owned),
            runner_id,
            hole,
            extra,
        });
    }

    /// Coordinate stream in output order: by timestamp, then golfers before
    /// runners, then actor id, delivery-flagged rows last.
    pub fn sorted_coordinates(&self) -> Vec<CoordinateRecord> {
        let mut records = self.coordinates.clone();
        records.sort_by(|a, b| {
            a.ts_s
                .cmp(&b.ts_s)
                .then_with(|| a.actor_kind.sort_code().cmp(&b.actor_kind.sort_code()))
                .then_with(|| a.actor_id.cmp(&b.actor_id))
                .then_with(|| a.is_delivery_event.cmp(&b.is_delivery_event))
        });
        records
    }
}

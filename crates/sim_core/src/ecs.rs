//! Entity Component System: components and state enums for orders, golfer
//! groups, and delivery runners.
//!
//! Components are attached to entities in the ECS world and mutated by the
//! event systems. Orders are created by the generator at scenario build;
//! after placement they are mutated only by dispatch and by the runner
//! that carries them.

use bevy_ecs::prelude::{Component, Entity};
use serde::Serialize;

use crate::course::NodeId;

/// Order lifecycle states, listed in transition order. `Failed` and
/// `Pending` are terminal side-exits: `Failed` when the order can never be
/// served, `Pending` when service closed with the order still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Queued,
    Prepping,
    InTransit,
    Delivered,
    Failed,
    Pending,
}

/// Why an order failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No cart path from the clubhouse to the predicted meeting node.
    Unroutable,
    /// The (re-)predicted meeting lands past service close + grace.
    ServiceClosed,
    /// No runner ever existed to take the order.
    NoRunner,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Unroutable => "unroutable",
            FailureReason::ServiceClosed => "service_closed",
            FailureReason::NoRunner => "no_runner",
        }
    }
}

/// A golfer group playing one round. `tee_time_s` is absolute simulation
/// time (service offsets already applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct GolferGroup {
    pub group_id: u32,
    pub tee_time_s: u64,
    pub size: u8,
}

#[derive(Debug, Clone, Component)]
pub struct Order {
    pub order_id: String,
    pub group: Entity,
    pub group_id: u32,
    /// Copied from the group so the predictor never needs a second lookup.
    pub tee_time_s: u64,
    pub placed_s: u64,
    pub hole_at_placement: u8,
    pub status: OrderStatus,
    pub failure: Option<FailureReason>,
    pub assigned_runner: Option<Entity>,
    pub predicted_meeting_node: Option<NodeId>,
    pub predicted_meeting_s: Option<u64>,
}

/// Timing funnel for one order (assignment through runner return).
#[derive(Debug, Clone, Copy, Default, Component)]
pub struct OrderTiming {
    pub assigned_s: Option<u64>,
    pub prep_done_s: Option<u64>,
    pub actual_meeting_s: Option<u64>,
    pub runner_return_s: Option<u64>,
}

impl OrderTiming {
    /// Placement to handoff; fixed once the order is delivered.
    pub fn delivery_cycle_s(&self, placed_s: u64) -> Option<u64> {
        self.actual_meeting_s.map(|m| m.saturating_sub(placed_s))
    }

    /// Placement to the runner's return at the clubhouse.
    pub fn total_cycle_s(&self, placed_s: u64) -> Option<u64> {
        self.runner_return_s.map(|r| r.saturating_sub(placed_s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Idle,
    Prepping,
    DrivingOut,
    Handoff,
    DrivingBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Runner {
    pub runner_id: u32,
    pub state: RunnerState,
    /// Last graph node reached; equals the clubhouse whenever idle.
    pub position: NodeId,
    pub current_order: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Idle,
    Prepping,
    DrivingOut,
    Handoff,
    DrivingBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivitySpan {
    pub start_s: u64,
    pub end_s: u64,
    pub kind: ActivityKind,
}

/// Per-runner activity history. Exactly one span is open at a time; each
/// state transition closes it and opens the next, so the spans partition
/// the runner's on-clock time.
#[derive(Debug, Clone, Default, Component)]
pub struct ActivityLog {
    open: Option<(u64, ActivityKind)>,
    spans: Vec<ActivitySpan>,
}

impl ActivityLog {
    /// Close the open span at `now` and begin a new one.
    pub fn begin(&mut self, now: u64, kind: ActivityKind) {
        self.close(now);
        self.open = Some((now, kind));
    }

    /// Close the open span at `now`, if any. Zero-length spans are dropped.
    pub fn close(&mut self, now: u64) {
        if let Some((start_s, kind)) = self.open.take() {
            if now > start_s {
                self.spans.push(ActivitySpan {
                    start_s,
                    end_s: now,
                    kind,
                });
            }
        }
    }

    pub fn spans(&self) -> &[ActivitySpan] {
        &self.spans
    }

    /// Total closed time spent in any of `kinds`.
    pub fn total_in(&self, kinds: &[ActivityKind]) -> u64 {
        self.spans
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .map(|s| s.end_s - s.start_s)
            .sum()
    }
}

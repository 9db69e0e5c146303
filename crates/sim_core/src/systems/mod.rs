//! Event systems: one per [`crate::clock::EventKind`], wired into the
//! schedule by [`crate::runner::simulation_schedule`].

pub mod arrive_at_meeting;
pub mod handoff_complete;
pub mod order_placed;
pub mod prep_complete;
pub mod return_complete;
pub mod service_close;
pub mod simulation_started;

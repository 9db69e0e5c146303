//! # On-Course Delivery Simulation Core
//!
//! A discrete-event simulation engine for food-and-beverage delivery on a
//! golf course: golfer groups advance along the course path, place orders
//! at random times, and a pool of runners dispatches from the clubhouse to
//! intercept them on the cart-path graph.
//!
//! ## Overview
//!
//! This crate provides the core simulation engine, including:
//!
//! - **Event Scheduling**: Second-precision discrete event system
//! - **ECS Framework**: Entity Component System for orders, groups, and runners
//! - **Course Model**: Cart-path graph, hole geofences, and the golfer path
//! - **Predict-and-Intercept**: Fixed-point meeting prediction for moving groups
//! - **Telemetry**: Event log, coordinate streams, and per-run KPIs
//!
//! ## Key Concepts
//!
//! - **Discrete Events**: All simulation progress happens through scheduled events
//! - **Deterministic**: Seeded RNG and insertion-ordered ties ensure reproducible runs
//! - **Strict Graph Routing**: Runners move only on the cart-path graph; an
//!   unreachable meeting node fails that order, never the run
//!
//! ## Example
//!
//! ```rust,no_run
//! use sim_core::runner::run_simulation;
//! use sim_core::scenario::SimulationConfig;
//! use sim_core::test_helpers::{synthetic_course, tee_sheet};
//!
//! let course = synthetic_course();
//! let config = SimulationConfig::default().with_seed(42).with_total_orders(10);
//! let sheet = tee_sheet(10, 600);
//! let result = run_simulation(course, &config, &sheet).expect("run");
//! println!("delivered {} orders", result.metrics.delivered);
//! ```

pub mod clock;
pub mod course;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod predict;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

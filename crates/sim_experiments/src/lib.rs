//! Parallel experimentation framework for delivery-staffing sweeps.
//!
//! This crate runs many simulations in parallel across staffing levels and
//! order volumes, aggregates repetitions with confidence bounds, and
//! recommends a runner count per (scenario, order level) via a Pareto
//! frontier and knee-point detection.
//!
//! # Quick Start
//!
//! ```no_run
//! use sim_core::test_helpers::{base_config, synthetic_course, tee_sheet};
//! use sim_experiments::{
//!     evaluate_sweep, run_staffing_sweep, ServiceTargets, StaffingSpace,
//! };
//!
//! let course = synthetic_course();
//! let sheet = tee_sheet(12, 900);
//!
//! // Define the sweep: order volumes x runner counts, N runs each.
//! let space = StaffingSpace::new("baseline", base_config())
//!     .order_levels(vec![20, 40])
//!     .runner_counts(vec![1, 2, 3])
//!     .runs_per_combination(10);
//!
//! let outcomes = run_staffing_sweep(&course, &sheet, space.generate(), None, true);
//! let recommendations = evaluate_sweep(&outcomes, &ServiceTargets::default());
//! for rec in &recommendations {
//!     println!("{}: {:?}", rec.order_level, rec.recommended_runner_count);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: sweep definition and per-run seed derivation
//! - [`runner`]: parallel execution using rayon
//! - [`aggregate`]: cross-run statistics and Wilson bounds
//! - [`staffing`]: composite score, Pareto frontier, knee point
//! - [`export`]: staffing summary CSV, parquet, and JSON exports

pub mod aggregate;
pub mod export;
pub mod parameters;
pub mod runner;
pub mod staffing;

pub use aggregate::{aggregate_runs, wilson_bounds, Aggregate, KpiStats, ServiceTargets};
pub use export::{export_recommendations_json, write_staffing_parquet, write_staffing_summary_csv};
pub use parameters::{Combination, StaffingSpace};
pub use runner::{run_staffing_sweep, CombinationOutcome};
pub use staffing::{evaluate_staffing, evaluate_sweep, StaffingRecommendation, StaffingRow};

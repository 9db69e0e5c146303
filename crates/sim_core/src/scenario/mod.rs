//! Scenario configuration and world building.

mod build;
mod params;

pub use build::{build_scenario, build_scenario_with_orders};
pub use params::{
    SimulationConfig, TeeTime, DEFAULT_GRACE_S, DEFAULT_HANDOFF_S, DEFAULT_PREP_TIME_S,
    DEFAULT_RUNNER_SPEED_M_S, DEFAULT_SERVICE_CLOSE_S, DEFAULT_SLA_S,
};

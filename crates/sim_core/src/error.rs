//! Error taxonomy for startup and load failures.
//!
//! Per-order failures (unroutable meeting nodes, stale predictions) are
//! domain states on [`crate::ecs::Order`], not errors. Everything here is
//! fatal for the operation that raised it: a run never starts on a bad
//! configuration or a bad course bundle.

use std::path::PathBuf;

use thiserror::Error;

/// Missing or contradictory simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service window is empty (open {open_s}s >= close {close_s}s)")]
    EmptyServiceWindow { open_s: u64, close_s: u64 },
    #[error("hourly distribution is empty")]
    EmptyHourlyDistribution,
    #[error("hourly distribution must cover {expected} service hours, got {actual} entries")]
    DistributionLength { expected: usize, actual: usize },
    #[error("hourly distribution sums to {sum}, expected 1.0")]
    DistributionSum { sum: f64 },
    #[error("hourly distribution entry {index} is negative ({value})")]
    NegativeDistributionEntry { index: usize, value: f64 },
    #[error("all 18 holes are blocked; nowhere left to place an order")]
    AllHolesBlocked,
    #[error("blocked hole {0} is outside 1..=18")]
    BlockedHoleOutOfRange(u8),
    #[error("runner speed must be positive, got {0} m/s")]
    NonPositiveSpeed(f64),
}

/// Structural problems in a course bundle.
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("course bundle file missing: {0}")]
    MissingFile(PathBuf),
    #[error("cart-path graph has no nodes")]
    EmptyGraph,
    #[error("edge references unknown node {0}")]
    UnknownEdgeNode(u32),
    #[error("edge length must be positive, got {0} m")]
    NonPositiveEdgeLength(f64),
    #[error("clubhouse node {0} reaches no other node")]
    IsolatedClubhouse(u32),
    #[error("no node near clubhouse coordinate ({lat}, {lon})")]
    ClubhouseOffGraph { lat: f64, lon: f64 },
    #[error("golfer path is empty")]
    EmptyGolferPath,
    #[error("golfer path time decreases at sample {index}")]
    NonMonotonicGolferPath { index: usize },
    #[error("golfer path references node {0} missing from the graph")]
    UnknownPathNode(u32),
    #[error("bundle has no hole polygons")]
    NoHolePolygons,
    #[error("hole {0} is outside 1..=18")]
    HoleOutOfRange(u8),
    #[error("no golfer path sample lies inside any hole polygon")]
    GolferPathOutsideHoles,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Top-level error for [`crate::runner::run_simulation`].
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Course(#[from] CourseError),
}

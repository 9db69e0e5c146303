//! File writers for per-run outputs: the unified coordinate stream (CSV
//! and parquet), the delivery-points projection, the event log, and the
//! JSON result documents. Column orders are stable; schema changes are
//! additive only.

mod coordinates;
mod events;
mod results;
mod utils;

pub use coordinates::{
    read_coordinates_csv, write_coordinates_csv, write_coordinates_parquet,
    write_delivery_points_csv,
};
pub use events::write_events_csv;
pub use results::{write_metrics_json, write_results_json};

//! Simulation configuration: one validated record constructed at startup;
//! every downstream component receives a read-only reference.

use std::collections::BTreeSet;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::ONE_HOUR_S;
use crate::error::ConfigError;

/// Default runner cart speed (m/s), ~6 mph.
pub const DEFAULT_RUNNER_SPEED_M_S: f64 = 2.68;
/// Default kitchen prep time.
pub const DEFAULT_PREP_TIME_S: u64 = 600;
/// Default handoff duration at the meeting point.
pub const DEFAULT_HANDOFF_S: u64 = 60;
/// Default service day: seven hours from open.
pub const DEFAULT_SERVICE_CLOSE_S: u64 = 7 * ONE_HOUR_S;
/// Default grace past close for in-flight and queued orders.
pub const DEFAULT_GRACE_S: u64 = 1800;
/// Default on-time threshold (35 min).
pub const DEFAULT_SLA_S: u64 = 2100;

const DISTRIBUTION_SUM_TOLERANCE: f64 = 1e-6;

/// One tee-sheet row. `tee_time_s` is relative to service open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeeTime {
    pub group_id: u32,
    pub tee_time_s: u64,
    pub size: u8,
}

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub runner_speed_m_s: f64,
    pub prep_time_s: u64,
    pub handoff_s: u64,
    pub service_open_s: u64,
    pub service_close_s: u64,
    pub grace_s: u64,
    /// On-time threshold for the delivery cycle.
    pub sla_s: u64,
    pub avg_order_value: f64,
    pub total_orders: u32,
    /// Per-hour share of order volume across the service window; must sum
    /// to 1 with one entry per (possibly partial) service hour.
    pub hourly_distribution: Vec<f64>,
    pub blocked_holes: BTreeSet<u8>,
    pub runner_count: u32,
    /// Repetitions per combination in batch sweeps.
    pub runs_per_combination: u32,
    pub base_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runner_speed_m_s: DEFAULT_RUNNER_SPEED_M_S,
            prep_time_s: DEFAULT_PREP_TIME_S,
            handoff_s: DEFAULT_HANDOFF_S,
            service_open_s: 0,
            service_close_s: DEFAULT_SERVICE_CLOSE_S,
            grace_s: DEFAULT_GRACE_S,
            sla_s: DEFAULT_SLA_S,
            avg_order_value: 25.0,
            total_orders: 30,
            hourly_distribution: vec![1.0 / 7.0; 7],
            blocked_holes: BTreeSet::new(),
            runner_count: 2,
            runs_per_combination: 10,
            base_seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_total_orders(mut self, total_orders: u32) -> Self {
        self.total_orders = total_orders;
        self
    }

    pub fn with_runner_count(mut self, runner_count: u32) -> Self {
        self.runner_count = runner_count;
        self
    }

    pub fn with_blocked_holes<I: IntoIterator<Item = u8>>(mut self, holes: I) -> Self {
        self.blocked_holes = holes.into_iter().collect();
        self
    }

    pub fn with_prep_time_s(mut self, prep_time_s: u64) -> Self {
        self.prep_time_s = prep_time_s;
        self
    }

    pub fn with_sla_s(mut self, sla_s: u64) -> Self {
        self.sla_s = sla_s;
        self
    }

    pub fn with_grace_s(mut self, grace_s: u64) -> Self {
        self.grace_s = grace_s;
        self
    }

    /// Set the service window and reset the hourly distribution to uniform
    /// over the new window.
    pub fn with_service_window(mut self, open_s: u64, close_s: u64) -> Self {
        self.service_open_s = open_s;
        self.service_close_s = close_s;
        let hours = self.service_hours().max(1);
        self.hourly_distribution = vec![1.0 / hours as f64; hours];
        self
    }

    pub fn with_hourly_distribution(mut self, distribution: Vec<f64>) -> Self {
        self.hourly_distribution = distribution;
        self
    }

    /// Number of (possibly partial) hours in the service window.
    pub fn service_hours(&self) -> usize {
        let window = self.service_close_s.saturating_sub(self.service_open_s);
        window.div_ceil(ONE_HOUR_S) as usize
    }

    pub fn shift_duration_s(&self) -> u64 {
        self.service_close_s.saturating_sub(self.service_open_s)
    }

    /// Last instant at which an order may still be handed off.
    pub fn close_with_grace_s(&self) -> u64 {
        self.service_close_s.saturating_add(self.grace_s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_close_s <= self.service_open_s {
            return Err(ConfigError::EmptyServiceWindow {
                open_s: self.service_open_s,
                close_s: self.service_close_s,
            });
        }
        if self.runner_speed_m_s <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed(self.runner_speed_m_s));
        }
        if self.hourly_distribution.is_empty() {
            return Err(ConfigError::EmptyHourlyDistribution);
        }
        let expected = self.service_hours();
        if self.hourly_distribution.len() != expected {
            return Err(ConfigError::DistributionLength {
                expected,
                actual: self.hourly_distribution.len(),
            });
        }
        for (index, value) in self.hourly_distribution.iter().enumerate() {
            if *value < 0.0 {
                return Err(ConfigError::NegativeDistributionEntry {
                    index,
                    value: *value,
                });
            }
        }
        let sum: f64 = self.hourly_distribution.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_SUM_TOLERANCE {
            return Err(ConfigError::DistributionSum { sum });
        }
        for hole in &self.blocked_holes {
            if *hole == 0 || *hole > 18 {
                return Err(ConfigError::BlockedHoleOutOfRange(*hole));
            }
        }
        if (1..=18u8).all(|h| self.blocked_holes.contains(&h)) {
            return Err(ConfigError::AllHolesBlocked);
        }
        Ok(())
    }
}

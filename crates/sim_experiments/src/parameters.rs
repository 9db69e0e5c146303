//! Sweep definition: order volumes x runner counts, with a fixed number of
//! seeded repetitions per combination.

use serde::Serialize;
use sim_core::scenario::SimulationConfig;

/// One (order_level, runner_count) cell of a sweep, with one config per
/// repetition (seeds pre-derived).
#[derive(Debug, Clone, Serialize)]
pub struct Combination {
    pub scenario_id: String,
    pub combination_index: usize,
    pub order_level: u32,
    pub runner_count: u32,
    pub run_configs: Vec<SimulationConfig>,
}

/// Builder for a staffing sweep over a base configuration.
#[derive(Debug, Clone)]
pub struct StaffingSpace {
    scenario_id: String,
    base: SimulationConfig,
    order_levels: Vec<u32>,
    runner_counts: Vec<u32>,
    runs_per_combination: u32,
}

impl StaffingSpace {
    pub fn new(scenario_id: impl Into<String>, base: SimulationConfig) -> Self {
        let runs_per_combination = base.runs_per_combination.max(1);
        Self {
            scenario_id: scenario_id.into(),
            base,
            order_levels: Vec::new(),
            runner_counts: Vec::new(),
            runs_per_combination,
        }
    }

    pub fn order_levels(mut self, levels: Vec<u32>) -> Self {
        self.order_levels = levels;
        self
    }

    pub fn runner_counts(mut self, counts: Vec<u32>) -> Self {
        self.runner_counts = counts;
        self
    }

    pub fn runs_per_combination(mut self, runs: u32) -> Self {
        self.runs_per_combination = runs.max(1);
        self
    }

    /// Cartesian product of order levels and runner counts, in declaration
    /// order. Empty dimensions fall back to the base config's values.
    pub fn generate(&self) -> Vec<Combination> {
        let order_levels = if self.order_levels.is_empty() {
            vec![self.base.total_orders]
        } else {
            self.order_levels.clone()
        };
        let runner_counts = if self.runner_counts.is_empty() {
            vec![self.base.runner_count]
        } else {
            self.runner_counts.clone()
        };

        let mut combinations = Vec::new();
        for order_level in &order_levels {
            for runner_count in &runner_counts {
                let combination_index = combinations.len();
                let run_configs = (0..self.runs_per_combination)
                    .map(|run_index| {
                        let mut config = self.base.clone();
                        config.total_orders = *order_level;
                        config.runner_count = *runner_count;
                        config.runs_per_combination = self.runs_per_combination;
                        config.base_seed =
                            derive_run_seed(self.base.base_seed, combination_index, run_index);
                        config
                    })
                    .collect();
                combinations.push(Combination {
                    scenario_id: self.scenario_id.clone(),
                    combination_index,
                    order_level: *order_level,
                    runner_count: *runner_count,
                    run_configs,
                });
            }
        }
        combinations
    }
}

/// Distinct, reproducible seed per (combination, repetition). Workers never
/// share a seed, so parallel runs stay independent.
pub fn derive_run_seed(base_seed: u64, combination_index: usize, run_index: u32) -> u64 {
    base_seed
        .wrapping_add((combination_index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add((run_index as u64).wrapping_mul(0x0000_0100_0000_01b3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::test_helpers::base_config;

    #[test]
    fn generates_the_cartesian_product_with_distinct_seeds() {
        let space = StaffingSpace::new("test", base_config())
            .order_levels(vec![10, 20])
            .runner_counts(vec![1, 2, 3])
            .runs_per_combination(4);
        let combinations = space.generate();
        assert_eq!(combinations.len(), 6);

        let mut seeds = std::collections::HashSet::new();
        for combination in &combinations {
            assert_eq!(combination.run_configs.len(), 4);
            for config in &combination.run_configs {
                assert_eq!(config.total_orders, combination.order_level);
                assert_eq!(config.runner_count, combination.runner_count);
                assert!(seeds.insert(config.base_seed), "duplicate seed");
            }
        }
    }

    #[test]
    fn empty_dimensions_fall_back_to_the_base_config() {
        let base = base_config().with_total_orders(17).with_runner_count(4);
        let combinations = StaffingSpace::new("fallback", base).generate();
        assert_eq!(combinations.len(), 1);
        assert_eq!(combinations[0].order_level, 17);
        assert_eq!(combinations[0].runner_count, 4);
    }

    #[test]
    fn seed_derivation_is_stable() {
        assert_eq!(derive_run_seed(42, 0, 0), 42);
        assert_ne!(derive_run_seed(42, 0, 1), derive_run_seed(42, 1, 0));
        assert_eq!(derive_run_seed(42, 3, 2), derive_run_seed(42, 3, 2));
    }
}

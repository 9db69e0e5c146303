//! Order generation: distributes a prescribed number of orders across the
//! service day, honouring the blocked-hole set at generation time (never as
//! a post-filter, which would silently shrink the order volume and corrupt
//! cross-scenario comparisons).
//!
//! Deterministic given the seed: sampling uses one `StdRng` stream and a
//! bounded retry-then-snap strategy, so the same configuration always
//! yields the same order list.

use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clock::ONE_HOUR_S;
use crate::course::Course;
use crate::error::ConfigError;
use crate::scenario::{SimulationConfig, TeeTime};

/// Sampling attempts per order before snapping to the nearest feasible
/// instant.
pub const MAX_SAMPLE_ATTEMPTS: u32 = 40;

/// One generated order, before it enters the world. `tee_time_s` is the
/// group's absolute tee time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedOrder {
    pub order_id: String,
    pub group_id: u32,
    pub tee_time_s: u64,
    pub placed_s: u64,
    pub hole_at_placement: u8,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedOrders {
    /// Sorted by placement time, same-second ties by group id; ids are
    /// assigned after the sort, so they are monotonic in that order.
    pub orders: Vec<GeneratedOrder>,
    /// Orders that could not be placed anywhere; non-zero only when no
    /// group has any non-blocked on-course time in the window.
    pub shortfall: usize,
}

struct GroupWindow {
    group_id: u32,
    tee_abs_s: u64,
}

/// Generate exactly `config.total_orders` orders, unless infeasible (the
/// shortfall is then reported, never silently absorbed).
pub fn generate_orders(
    course: &Course,
    tee_sheet: &[TeeTime],
    config: &SimulationConfig,
) -> Result<GeneratedOrders, ConfigError> {
    config.validate()?;

    let total = config.total_orders as usize;
    if total == 0 {
        return Ok(GeneratedOrders::default());
    }

    let groups: Vec<GroupWindow> = tee_sheet
        .iter()
        .map(|t| GroupWindow {
            group_id: t.group_id,
            tee_abs_s: config.service_open_s + t.tee_time_s,
        })
        .collect();
    if groups.is_empty() {
        warn!("empty tee sheet: all {total} orders fall short");
        return Ok(GeneratedOrders {
            orders: Vec::new(),
            shortfall: total,
        });
    }

    let hour_weights = WeightedIndex::new(config.hourly_distribution.iter().copied())
        .map_err(|_| ConfigError::DistributionSum {
            sum: config.hourly_distribution.iter().sum(),
        })?;
    let mut rng = StdRng::seed_from_u64(config.base_seed);
    let round_s = course.round_duration_s();
    let window_end = config.service_close_s;

    let mut placements: Vec<(u64, u32, u8)> = Vec::with_capacity(total);
    let mut shortfall = 0usize;

    for _ in 0..total {
        let mut chosen: Option<(u64, u32, u8)> = None;
        let mut last_draw_s = config.service_open_s;
        let mut last_group: Option<usize> = None;

        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let hour = hour_weights.sample(&mut rng);
            let hour_start = config.service_open_s + hour as u64 * ONE_HOUR_S;
            let hour_len = ONE_HOUR_S.min(window_end.saturating_sub(hour_start)).max(1);
            let t = hour_start + rng.gen_range(0..hour_len);
            last_draw_s = t;

            let active: Vec<usize> = groups
                .iter()
                .enumerate()
                .filter(|(_, g)| g.tee_abs_s <= t && t <= g.tee_abs_s + round_s)
                .map(|(i, _)| i)
                .collect();
            if active.is_empty() {
                continue;
            }
            let group_index = active[rng.gen_range(0..active.len())];
            last_group = Some(group_index);

            let hole = course.group_hole_at(groups[group_index].tee_abs_s, t);
            if !config.blocked_holes.contains(&hole) {
                chosen = Some((t, groups[group_index].group_id, hole));
                break;
            }
        }

        // Sampling exhausted: snap to the feasible instant nearest the last
        // draw, searching the drawn group first, then every group.
        if chosen.is_none() {
            if let Some(group_index) = last_group {
                chosen = snap_to_feasible(course, config, &groups[group_index], last_draw_s);
            }
            if chosen.is_none() {
                chosen = groups
                    .iter()
                    .filter_map(|g| snap_to_feasible(course, config, g, last_draw_s))
                    .min_by_key(|(t, _, _)| t.abs_diff(last_draw_s));
            }
        }

        match chosen {
            Some(placement) => placements.push(placement),
            None => shortfall += 1,
        }
    }

    if shortfall > 0 {
        warn!(
            "order generation fell short by {shortfall} of {total}: no group has \
             non-blocked on-course time in the service window"
        );
    }

    // Ids do not exist yet, so same-second ties break by group id (the
    // sort is stable for fully identical pairs).
    placements.sort_by_key(|(t, group_id, _)| (*t, *group_id));
    let tee_by_group = |group_id: u32| {
        groups
            .iter()
            .find(|g| g.group_id == group_id)
            .map(|g| g.tee_abs_s)
            .unwrap_or(0)
    };
    let orders = placements
        .into_iter()
        .enumerate()
        .map(|(index, (placed_s, group_id, hole))| GeneratedOrder {
            order_id: format!("order-{:04}", index + 1),
            group_id,
            tee_time_s: tee_by_group(group_id),
            placed_s,
            hole_at_placement: hole,
        })
        .collect();

    Ok(GeneratedOrders { orders, shortfall })
}

/// Nearest instant to `target` at which `group` is on-course, inside the
/// service window, and not on a blocked hole. Scans the golfer-path sample
/// grid; earlier instants win ties.
fn snap_to_feasible(
    course: &Course,
    config: &SimulationConfig,
    group: &GroupWindow,
    target: u64,
) -> Option<(u64, u32, u8)> {
    let mut best: Option<(u64, u64, u8)> = None;
    for (index, sample) in course.golfer_path.samples().iter().enumerate() {
        let t = group.tee_abs_s + sample.elapsed_s;
        if t < config.service_open_s || t >= config.service_close_s {
            continue;
        }
        let hole = course.hole_at_sample(index);
        if config.blocked_holes.contains(&hole) {
            continue;
        }
        let distance = t.abs_diff(target);
        let better = match best {
            None => true,
            Some((best_distance, best_t, _)) => {
                distance < best_distance || (distance == best_distance && t < best_t)
            }
        };
        if better {
            best = Some((distance, t, hole));
        }
    }
    best.map(|(_, t, hole)| (t, group.group_id, hole))
}

//! Predict-and-intercept: where a runner leaving the clubhouse meets a
//! group moving along the golfer path.
//!
//! The meeting time is a fixed point: a later meeting puts the group
//! farther along the (non-decreasing) path, which can only lengthen the
//! drive, so the iteration is monotone and settles quickly.

use thiserror::Error;

use crate::course::{Course, NodeId};
use crate::routing::RoutePlanner;

pub const MAX_ITERATIONS: u32 = 6;
pub const CONVERGENCE_TOLERANCE_S: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub meeting_node: NodeId,
    pub meeting_s: u64,
    pub iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("no cart path from the clubhouse to node {0}")]
    Unroutable(NodeId),
}

/// Predict the meeting for an order placed at `t0` by the group that teed
/// off at `tee_time_s`.
///
/// Starts at `t0 + prep` (the runner cannot depart earlier), then
/// alternates between "where is the group then" and "how long is the drive
/// there", keeping `meeting = max(t0 + prep, t0 + drive)`. Stops when two
/// successive meeting times agree within one second, or after six rounds.
pub fn predict_intercept(
    course: &Course,
    planner: &RoutePlanner,
    tee_time_s: u64,
    t0: u64,
    prep_time_s: u64,
    runner_speed_m_s: f64,
) -> Result<Prediction, PredictError> {
    let earliest_s = t0 + prep_time_s;
    let mut meeting_s = earliest_s;
    let mut meeting_node = course.group_node_at(tee_time_s, meeting_s);
    let mut iterations = 0;

    for _ in 0..MAX_ITERATIONS {
        iterations += 1;
        let drive_s = planner
            .drive_time_s(course.clubhouse, meeting_node, runner_speed_m_s)
            .ok_or(PredictError::Unroutable(meeting_node))?;
        let next_s = earliest_s.max(t0 + drive_s);
        let next_node = course.group_node_at(tee_time_s, next_s);
        let delta = next_s.abs_diff(meeting_s);
        meeting_s = next_s;
        meeting_node = next_node;
        if delta <= CONVERGENCE_TOLERANCE_S {
            break;
        }
    }

    Ok(Prediction {
        meeting_node,
        meeting_s,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{detached_segment_course, synthetic_course, DETACHED_SEGMENT};

    #[test]
    fn meeting_never_precedes_placement_plus_prep() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course.clone());
        let prediction =
            predict_intercept(&course, &planner, 0, 1200, 600, 2.68).expect("prediction");
        assert!(prediction.meeting_s >= 1800);
        assert!(prediction.iterations <= MAX_ITERATIONS);
    }

    #[test]
    fn prep_dominated_orders_meet_at_prep_completion() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course.clone());
        // Group just teed off: it is still near the clubhouse when prep
        // finishes, so the short drive never pushes the meeting later.
        let prediction =
            predict_intercept(&course, &planner, 0, 60, 600, 2.68).expect("prediction");
        assert_eq!(prediction.meeting_s, 660);
        assert_eq!(
            prediction.meeting_node,
            course.group_node_at(0, prediction.meeting_s)
        );
    }

    #[test]
    fn meeting_sequence_is_monotone_under_growing_drives() {
        let course = synthetic_course();
        let planner = RoutePlanner::new(course.clone());
        // Mid-round group: the drive exceeds prep, so the fixed point sits
        // past t0 + prep and tracks the group's forward motion.
        let t0 = 7000;
        let prediction =
            predict_intercept(&course, &planner, 0, t0, 300, 2.68).expect("prediction");
        assert!(prediction.meeting_s > t0 + 300);
        let drive = planner
            .drive_time_s(course.clubhouse, prediction.meeting_node, 2.68)
            .expect("drive");
        // At the fixed point the meeting equals the drive-limited bound.
        assert_eq!(prediction.meeting_s, t0 + drive);
    }

    #[test]
    fn unroutable_meeting_node_is_an_explicit_error() {
        let course = detached_segment_course();
        let planner = RoutePlanner::new(course.clone());
        // Place the order so the group sits inside the detached stretch
        // when prep completes.
        let t0 = DETACHED_SEGMENT.order_time_s;
        let err = predict_intercept(&course, &planner, 0, t0, 600, 2.68);
        assert!(matches!(err, Err(PredictError::Unroutable(_))));
    }
}

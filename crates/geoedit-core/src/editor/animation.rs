//! Step-driven animation that slides two polyline nodes together.

use crate::geo::Coordinate;

/// Two nodes travelling to their great-circle midpoint.
///
/// The host advances it once per `merge_animation_interval`; the owning
/// editor commits the merge when [`MergeAnimation::is_finished`] turns true.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeAnimation {
    /// Index of the node that disappears when the merge commits.
    pub first: usize,
    /// Index of the surviving node.
    pub second: usize,
    first_origin: Coordinate,
    second_origin: Coordinate,
    target: Coordinate,
    step: u32,
    steps: u32,
}

impl MergeAnimation {
    pub fn new(
        first: usize,
        second: usize,
        first_origin: Coordinate,
        second_origin: Coordinate,
        steps: u32,
    ) -> Self {
        Self {
            first,
            second,
            first_origin,
            second_origin,
            target: first_origin.interpolate(&second_origin, 0.5),
            step: 0,
            steps: steps.max(1),
        }
    }

    /// Where both nodes end up.
    pub fn target(&self) -> Coordinate {
        self.target
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Fraction of the way travelled, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        f64::from(self.step) / f64::from(self.steps)
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.steps
    }

    /// Run one step and return the new positions of (first, second).
    pub fn advance(&mut self) -> (Coordinate, Coordinate) {
        self.step = (self.step + 1).min(self.steps);
        let t = self.progress();
        (
            self.first_origin.interpolate(&self.target, t),
            self.second_origin.interpolate(&self.target, t),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animation(steps: u32) -> MergeAnimation {
        MergeAnimation::new(
            1,
            2,
            Coordinate::from_degrees(0.0, 0.0),
            Coordinate::from_degrees(2.0, 0.0),
            steps,
        )
    }

    #[test]
    fn test_nodes_meet_at_midpoint() {
        let mut anim = animation(4);
        let mut last = (Coordinate::default(), Coordinate::default());
        while !anim.is_finished() {
            last = anim.advance();
        }
        assert_eq!(anim.step(), 4);
        assert!(last.0.approx_eq(&anim.target(), 1e-12));
        assert!(last.1.approx_eq(&anim.target(), 1e-12));
        assert!((anim.target().lon_degrees() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_steps_move_monotonically() {
        let mut anim = animation(10);
        let (a, b) = anim.advance();
        assert!(a.lon_degrees() > 0.0 && a.lon_degrees() < 1.0);
        assert!(b.lon_degrees() < 2.0 && b.lon_degrees() > 1.0);
        let (a2, _) = anim.advance();
        assert!(a2.lon_degrees() > a.lon_degrees());
    }

    #[test]
    fn test_zero_steps_finishes_in_one() {
        let mut anim = animation(0);
        assert!(!anim.is_finished());
        anim.advance();
        assert!(anim.is_finished());
        assert!((anim.progress() - 1.0).abs() < f64::EPSILON);
    }
}

use std::f32::consts::TAU;

use crate::{Film3dError, Result};

/// Default increment between two captured angles, in radians.
pub const DEFAULT_STEP: f32 = 0.05;

/// Finite sequence of rotation angles covering one full revolution.
///
/// Yields `start + i * step` for `i` in `0..=ceil(2π / step)`, so the last
/// angle is at or past `start + 2π`. Angles are computed from the index
/// rather than accumulated, which keeps long sequences free of drift.
#[derive(Debug, Clone)]
pub struct RotationSequence {
    start: f32,
    step: f32,
    next: usize,
    len: usize,
}

impl RotationSequence {
    pub fn new(start: f32, step: f32) -> Result<Self> {
        // `!(step > 0.0)` also rejects NaN.
        if !(step > 0.0) || !step.is_finite() {
            return Err(Film3dError::InvalidStepSize(step));
        }

        Ok(Self {
            start,
            step,
            next: 0,
            len: Self::len_for_step(step),
        })
    }

    /// Sequence starting at `start` with [`DEFAULT_STEP`].
    pub fn from_angle(start: f32) -> Self {
        Self {
            start,
            step: DEFAULT_STEP,
            next: 0,
            len: Self::len_for_step(DEFAULT_STEP),
        }
    }

    fn len_for_step(step: f32) -> usize {
        (TAU / step).ceil() as usize + 1
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Total number of angles in a full revolution, consumed or not.
    pub fn total(&self) -> usize {
        self.len
    }

    /// Index of the next angle to be yielded.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.len
    }

    /// Rewinds to the first angle.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for RotationSequence {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.is_exhausted() {
            return None;
        }
        let angle = self.start + self.next as f32 * self.step;
        self.next += 1;
        Some(angle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RotationSequence {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_covers_one_revolution() {
        let angles: Vec<f32> = RotationSequence::from_angle(0.0).collect();

        assert_eq!(angles.len(), 127);
        assert_eq!(angles[0], 0.0);
        assert!(*angles.last().unwrap() >= TAU);
        assert!(*angles.last().unwrap() < TAU + DEFAULT_STEP);
    }

    #[test]
    fn emits_ceil_count_plus_one_for_various_steps() {
        for (step, expected) in [(1.0_f32, 8), (0.5, 14), (0.3, 22), (2.0, 5), (10.0, 2)] {
            let sequence = RotationSequence::new(0.7, step).unwrap();
            assert_eq!(sequence.total(), expected, "step {step}");
            assert_eq!(sequence.count(), expected, "step {step}");
        }
    }

    #[test]
    fn angles_strictly_increase_from_start() {
        for start in [-3.0_f32, 0.0, 1.25, 12.0] {
            for step in [0.01_f32, 0.05, 0.7, 3.0] {
                let angles: Vec<f32> = RotationSequence::new(start, step).unwrap().collect();

                assert_eq!(angles[0], start);
                assert!(angles.windows(2).all(|pair| pair[1] > pair[0]));
                let last = *angles.last().unwrap();
                assert!(last >= start + TAU - 1e-4, "start {start} step {step}");
            }
        }
    }

    #[test]
    fn rejects_non_positive_steps() {
        for step in [0.0_f32, -0.05, f32::NAN, f32::INFINITY] {
            let err = RotationSequence::new(0.0, step).unwrap_err();
            assert!(matches!(err, Film3dError::InvalidStepSize(_)));
        }
    }

    #[test]
    fn restart_replays_the_same_angles() {
        let mut sequence = RotationSequence::new(0.2, 0.9).unwrap();
        let first: Vec<f32> = sequence.by_ref().collect();
        assert!(sequence.is_exhausted());
        assert_eq!(sequence.next(), None);

        sequence.restart();
        let second: Vec<f32> = sequence.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reports_remaining_length() {
        let mut sequence = RotationSequence::new(0.0, 1.0).unwrap();
        assert_eq!(sequence.len(), 8);
        sequence.next();
        sequence.next();
        assert_eq!(sequence.len(), 6);
        assert_eq!(sequence.position(), 2);
    }
}

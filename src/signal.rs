//! Landmark normalization and per-frame eye-state classification.

use serde::{Deserialize, Serialize};

/// Normalized frame-space point, both axes in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Upper and lower eyelid landmarks of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarks {
    pub top: Point,
    pub bottom: Point,
}

impl EyeLandmarks {
    pub fn openness(&self) -> f64 {
        (self.top.y - self.bottom.y).abs()
    }
}

/// The landmark subset the controller needs from one detected face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLandmarks {
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
    pub iris: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub timestamp_ms: u64,
    pub left_height: f64,
    pub right_height: f64,
    pub iris: Point,
}

impl FrameSample {
    /// Reduce raw landmarks to openness scalars; the iris passes through.
    pub fn from_landmarks(timestamp_ms: u64, face: &FaceLandmarks) -> Self {
        Self {
            timestamp_ms,
            left_height: face.left_eye.openness(),
            right_height: face.right_eye.openness(),
            iris: face.iris,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    Open,
    LeftClosed,
    RightClosed,
    BothClosed,
}

impl EyeState {
    pub fn classify(left_height: f64, right_height: f64, threshold: f64) -> Self {
        let left = left_height < threshold;
        let right = right_height < threshold;
        match (left, right) {
            (true, true) => EyeState::BothClosed,
            (true, false) => EyeState::LeftClosed,
            (false, true) => EyeState::RightClosed,
            (false, false) => EyeState::Open,
        }
    }

    pub fn of(sample: &FrameSample, threshold: f64) -> Self {
        Self::classify(sample.left_height, sample.right_height, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TH: f64 = 0.015;

    fn eye(top: f64, bottom: f64) -> EyeLandmarks {
        EyeLandmarks {
            top: Point::new(0.4, top),
            bottom: Point::new(0.4, bottom),
        }
    }

    #[test]
    fn openness_is_absolute_vertical_distance() {
        assert!((eye(0.40, 0.42).openness() - 0.02).abs() < 1e-12);
        assert!((eye(0.42, 0.40).openness() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn sample_passes_iris_through() {
        let face = FaceLandmarks {
            left_eye: eye(0.40, 0.43),
            right_eye: eye(0.40, 0.405),
            iris: Point::new(0.31, 0.77),
        };
        let s = FrameSample::from_landmarks(42, &face);
        assert_eq!(s.timestamp_ms, 42);
        assert_eq!(s.iris, Point::new(0.31, 0.77));
        assert!((s.left_height - 0.03).abs() < 1e-12);
        assert!((s.right_height - 0.005).abs() < 1e-12);
    }

    #[test]
    fn classifies_all_four_states() {
        assert_eq!(EyeState::classify(0.02, 0.02, TH), EyeState::Open);
        assert_eq!(EyeState::classify(0.01, 0.02, TH), EyeState::LeftClosed);
        assert_eq!(EyeState::classify(0.02, 0.01, TH), EyeState::RightClosed);
        assert_eq!(EyeState::classify(0.01, 0.01, TH), EyeState::BothClosed);
    }

    #[test]
    fn threshold_is_exclusive() {
        // exactly at threshold counts as open
        assert_eq!(EyeState::classify(TH, TH, TH), EyeState::Open);
        assert_eq!(EyeState::classify(0.0149, TH, TH), EyeState::LeftClosed);
    }
}

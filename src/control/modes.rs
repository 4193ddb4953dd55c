//! Shutdown dwell and drag-selection mode controllers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Active,
    Paused,
}

impl ControlMode {
    pub fn toggled(self) -> Self {
        match self {
            ControlMode::Active => ControlMode::Paused,
            ControlMode::Paused => ControlMode::Active,
        }
    }
}

/// Tracks how long both eyes have been continuously closed.
#[derive(Debug, Clone, Default)]
pub struct ShutdownDwell {
    dwell_ms: u64,
    started_ms: Option<u64>,
}

impl ShutdownDwell {
    pub fn new(dwell_ms: u64) -> Self {
        Self {
            dwell_ms,
            started_ms: None,
        }
    }

    /// Returns true once the closure has lasted strictly longer than the dwell.
    /// Any open frame discards the timer.
    pub fn update(&mut self, both_closed: bool, now_ms: u64) -> bool {
        if !both_closed {
            self.started_ms = None;
            return false;
        }
        match self.started_ms {
            None => {
                self.started_ms = Some(now_ms);
                false
            }
            Some(t0) => now_ms.saturating_sub(t0) > self.dwell_ms,
        }
    }

    pub fn dwelling_since(&self) -> Option<u64> {
        self.started_ms
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEdge {
    Press,
    Release,
}

/// Level-triggered pointer-button hold driven by the right eye.
#[derive(Debug, Clone)]
pub struct SelectionController {
    min_frames: u32,
    streak: u32,
    state: SelectionState,
}

impl SelectionController {
    /// `min_frames` of 1 flips on the first RightClosed frame.
    pub fn new(min_frames: u32) -> Self {
        Self {
            min_frames: min_frames.max(1),
            streak: 0,
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn update(&mut self, right_closed: bool) -> Option<SelectionEdge> {
        if right_closed {
            self.streak = self.streak.saturating_add(1);
            if self.state == SelectionState::Idle && self.streak >= self.min_frames {
                self.state = SelectionState::Selecting;
                return Some(SelectionEdge::Press);
            }
            return None;
        }
        self.streak = 0;
        if self.state == SelectionState::Selecting {
            self.state = SelectionState::Idle;
            return Some(SelectionEdge::Release);
        }
        None
    }

    /// Force the button up; used when the loop exits mid-drag.
    pub fn release(&mut self) -> Option<SelectionEdge> {
        self.streak = 0;
        match self.state {
            SelectionState::Selecting => {
                self.state = SelectionState::Idle;
                Some(SelectionEdge::Release)
            }
            SelectionState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dwell_fires_only_after_strictly_exceeding() {
        let mut d = ShutdownDwell::new(5000);
        assert!(!d.update(true, 1000));
        assert!(!d.update(true, 6000));
        assert!(d.update(true, 6001));
    }

    #[test]
    fn open_frame_discards_dwell() {
        let mut d = ShutdownDwell::new(5000);
        d.update(true, 0);
        d.update(true, 4900);
        assert!(!d.update(false, 4950));
        assert_eq!(d.dwelling_since(), None);
        assert!(!d.update(true, 5000));
        assert!(!d.update(true, 9000));
        assert_eq!(d.dwelling_since(), Some(5000));
    }

    #[test]
    fn selection_presses_once_and_releases_once() {
        for n in 1..6 {
            let mut s = SelectionController::new(1);
            let mut edges = vec![];
            for _ in 0..n {
                edges.extend(s.update(true));
            }
            edges.extend(s.update(false));
            edges.extend(s.update(false));
            assert_eq!(edges, vec![SelectionEdge::Press, SelectionEdge::Release]);
        }
    }

    #[test]
    fn min_frames_adds_hysteresis() {
        let mut s = SelectionController::new(3);
        assert_eq!(s.update(true), None);
        assert_eq!(s.update(true), None);
        assert_eq!(s.update(false), None);
        assert_eq!(s.update(true), None);
        assert_eq!(s.update(true), None);
        assert_eq!(s.update(true), Some(SelectionEdge::Press));
        assert_eq!(s.state(), SelectionState::Selecting);
    }

    #[test]
    fn forced_release_only_when_selecting() {
        let mut s = SelectionController::new(1);
        assert_eq!(s.release(), None);
        s.update(true);
        assert_eq!(s.release(), Some(SelectionEdge::Release));
        assert_eq!(s.state(), SelectionState::Idle);
    }

    #[test]
    fn mode_toggles() {
        assert_eq!(ControlMode::Active.toggled(), ControlMode::Paused);
        assert_eq!(ControlMode::Paused.toggled(), ControlMode::Active);
    }
}

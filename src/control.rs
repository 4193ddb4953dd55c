//! Per-frame gaze/blink interpretation.
//!
//! All mutable controller state lives in one [`ControlState`] owned by the
//! driving loop and passed into [`process_frame`] each frame. Order within a
//! frame is fixed: shutdown dwell, close-window hotkey, selection, blink
//! aggregation, then (only while active) cursor and scroll.

mod blink;
mod cooldown;
mod modes;
mod pointer;

pub use modes::{ControlMode, SelectionState};

use blink::{BlinkAggregator, BlinkGesture};
use modes::{SelectionController, SelectionEdge, ShutdownDwell};
use pointer::{CursorMapper, ScrollTrigger};

use log::{debug, info};
use serde::Serialize;

use crate::actions::Action;
use crate::config::Profile;
use crate::signal::{EyeState, FrameSample, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// Both eyes stayed closed past the shutdown dwell.
    ShutdownDwell,
    /// The close-window hotkey fired.
    CloseWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt(HaltReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub actions: Vec<Action>,
    pub flow: Flow,
}

impl FrameOutcome {
    fn halted(reason: HaltReason) -> Self {
        Self {
            actions: vec![],
            flow: Flow::Halt(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlState {
    mode: ControlMode,
    shutdown: ShutdownDwell,
    selection: SelectionController,
    blinks: BlinkAggregator,
    cursor: CursorMapper,
    scroll: ScrollTrigger,
    last_eyes: Option<EyeState>,
    last_iris: Option<Point>,
    halted: Option<HaltReason>,
}

impl ControlState {
    pub fn new(profile: &Profile, start_ms: u64) -> Self {
        let th = &profile.thresholds;
        Self {
            mode: ControlMode::Active,
            shutdown: ShutdownDwell::new(th.shutdown_dwell_ms),
            selection: SelectionController::new(th.selection_min_frames),
            blinks: BlinkAggregator::new(
                th.blink_cooldown_ms,
                th.blink_window_ms,
                profile.blink.dispatch,
            ),
            cursor: CursorMapper::new(profile.screen, th.smooth_alpha),
            scroll: ScrollTrigger::new(profile.scroll.clone(), th.scroll_cooldown_ms, start_ms),
            last_eyes: None,
            last_iris: None,
            halted: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    /// A frame arrived without a face. Pending blinks still age out.
    pub fn note_no_face(&mut self, now_ms: u64) {
        if self.halted.is_none() {
            self.blinks.expire(now_ms);
        }
    }

    /// Release a held button on the way out; returns the action to send.
    pub fn release_selection(&mut self) -> Option<Action> {
        self.selection.release().map(|_| Action::MouseUp)
    }

    pub fn view(&self) -> ControlView {
        ControlView {
            mode: self.mode,
            selection: self.selection.state(),
            blink_count: self.blinks.count(),
            eyes: self.last_eyes,
            iris: self.last_iris,
            cursor: self.cursor.position(),
            dead_zone: self.scroll.dead_zone(),
            eyes_closed_since_ms: self.shutdown.dwelling_since(),
            halted: self.halted,
        }
    }
}

/// Read-only snapshot for overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlView {
    pub mode: ControlMode,
    pub selection: SelectionState,
    pub blink_count: usize,
    pub eyes: Option<EyeState>,
    pub iris: Option<Point>,
    pub cursor: (f64, f64),
    pub dead_zone: (f64, f64),
    /// Start of the current both-eyes-closed dwell, for a shutdown countdown.
    pub eyes_closed_since_ms: Option<u64>,
    pub halted: Option<HaltReason>,
}

pub fn process_frame(
    state: &mut ControlState,
    profile: &Profile,
    sample: &FrameSample,
) -> FrameOutcome {
    if let Some(reason) = state.halted {
        return FrameOutcome::halted(reason);
    }

    let now = sample.timestamp_ms;
    let eyes = EyeState::of(sample, profile.thresholds.blink);
    state.last_eyes = Some(eyes);
    state.last_iris = Some(sample.iris);
    let mut actions = Vec::new();

    if state.shutdown.update(eyes == EyeState::BothClosed, now) {
        info!(
            "eyes closed for over {} ms; shutting down",
            profile.thresholds.shutdown_dwell_ms
        );
        state.halted = Some(HaltReason::ShutdownDwell);
        actions.push(Action::Shutdown);
        return FrameOutcome {
            actions,
            flow: Flow::Halt(HaltReason::ShutdownDwell),
        };
    }

    if profile.close_window.enabled && eyes == EyeState::LeftClosed {
        info!("left eye closed; closing active window");
        state.halted = Some(HaltReason::CloseWindow);
        actions.push(Action::KeyChord(profile.close_window.chord.clone()));
        actions.push(Action::Shutdown);
        return FrameOutcome {
            actions,
            flow: Flow::Halt(HaltReason::CloseWindow),
        };
    }

    match state.selection.update(eyes == EyeState::RightClosed) {
        Some(SelectionEdge::Press) => {
            info!("selection on");
            actions.push(Action::MouseDown);
        }
        Some(SelectionEdge::Release) => {
            info!("selection released");
            actions.push(Action::MouseUp);
        }
        None => {}
    }

    if let Some(gesture) = state.blinks.update(eyes == EyeState::BothClosed, now) {
        debug!("blink gesture {gesture:?}");
        match gesture {
            BlinkGesture::Click => actions.push(Action::Click),
            BlinkGesture::DoubleClick => actions.push(Action::DoubleClick),
            BlinkGesture::RightClick => actions.push(Action::RightClick),
            BlinkGesture::TogglePause => {
                state.mode = state.mode.toggled();
                info!(
                    "eye control {}",
                    match state.mode {
                        ControlMode::Paused => "paused",
                        ControlMode::Active => "resumed",
                    }
                );
            }
        }
    }

    if state.mode == ControlMode::Paused {
        return FrameOutcome {
            actions,
            flow: Flow::Continue,
        };
    }

    let (x, y) = state.cursor.update(sample.iris);
    actions.push(Action::MoveTo { x, y });

    if let Some((dir, amount)) = state.scroll.update(sample.iris.y, now) {
        debug!("scroll {dir:?} ({amount})");
        actions.push(Action::Scroll(amount));
    }

    FrameOutcome {
        actions,
        flow: Flow::Continue,
    }
}

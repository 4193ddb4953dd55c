//! Gaze-to-cursor mapping and dead-zone scrolling.

use super::cooldown::Cooldown;
use crate::config::{Screen, ScrollSettings};
use crate::signal::Point;

/// Exponentially smoothed screen position of the iris.
#[derive(Debug, Clone)]
pub struct CursorMapper {
    alpha: f64,
    width: f64,
    height: f64,
    prev: (f64, f64),
}

impl CursorMapper {
    pub fn new(screen: Screen, alpha: f64) -> Self {
        Self {
            alpha,
            width: f64::from(screen.width),
            height: f64::from(screen.height),
            prev: (0.0, 0.0),
        }
    }

    pub fn position(&self) -> (f64, f64) {
        self.prev
    }

    pub fn update(&mut self, iris: Point) -> (f64, f64) {
        let sx = iris.x * self.width;
        let sy = iris.y * self.height;
        let a = self.alpha;
        self.prev = (a * sx + (1.0 - a) * self.prev.0, a * sy + (1.0 - a) * self.prev.1);
        self.prev
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    settings: ScrollSettings,
    cooldown: Cooldown,
}

impl ScrollTrigger {
    /// The cooldown starts armed at `start_ms`.
    pub fn new(settings: ScrollSettings, cooldown_ms: u64, start_ms: u64) -> Self {
        Self {
            settings,
            cooldown: Cooldown::armed_at(cooldown_ms, start_ms),
        }
    }

    pub fn dead_zone(&self) -> (f64, f64) {
        (self.settings.dead_zone_top, self.settings.dead_zone_bottom)
    }

    /// Returns the direction and wheel amount when a scroll fires.
    pub fn update(&mut self, iris_y: f64, now_ms: u64) -> Option<(ScrollDirection, i32)> {
        if !self.cooldown.ready(now_ms) {
            return None;
        }
        let fired = if iris_y < self.settings.dead_zone_top {
            (ScrollDirection::Up, self.settings.up_amount)
        } else if iris_y > self.settings.dead_zone_bottom {
            (ScrollDirection::Down, self.settings.down_amount)
        } else {
            return None;
        };
        self.cooldown.fire(now_ms);
        Some(fired)
    }
}

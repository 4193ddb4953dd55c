//! Blink debouncing and sliding-window aggregation.

use std::collections::VecDeque;

use super::cooldown::Cooldown;
use crate::config::DispatchPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkGesture {
    Click,
    DoubleClick,
    TogglePause,
    RightClick,
}

impl BlinkGesture {
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(BlinkGesture::Click),
            2 => Some(BlinkGesture::DoubleClick),
            3 => Some(BlinkGesture::TogglePause),
            _ => Some(BlinkGesture::RightClick),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlinkAggregator {
    cooldown: Cooldown,
    window_ms: u64,
    policy: DispatchPolicy,
    window: VecDeque<u64>,
    last_seen_ms: Option<u64>,
}

impl BlinkAggregator {
    pub fn new(cooldown_ms: u64, window_ms: u64, policy: DispatchPolicy) -> Self {
        Self {
            cooldown: Cooldown::new(cooldown_ms),
            window_ms,
            policy,
            window: VecDeque::with_capacity(8),
            last_seen_ms: None,
        }
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }

    #[cfg(test)]
    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.window.iter().copied()
    }

    /// Advances time on a frame without eye data. Blinks that age out here
    /// are dropped without producing a gesture.
    pub fn expire(&mut self, now_ms: u64) {
        self.last_seen_ms = Some(now_ms);
        self.prune(now_ms);
    }

    /// A gap longer than the window means every pending blink is stale.
    fn forget_after_gap(&mut self, now_ms: u64) {
        if self
            .last_seen_ms
            .is_some_and(|last| now_ms.saturating_sub(last) > self.window_ms)
        {
            self.window.clear();
        }
        self.last_seen_ms = Some(now_ms);
    }

    fn record(&mut self, both_closed: bool, now_ms: u64) {
        if both_closed && self.cooldown.try_fire(now_ms) {
            self.window.push_back(now_ms);
        }
    }

    fn prune(&mut self, now_ms: u64) {
        while let Some(&t) = self.window.front() {
            if now_ms.saturating_sub(t) < self.window_ms {
                break;
            }
            self.window.pop_front();
        }
    }

    fn take(&mut self) -> Option<BlinkGesture> {
        let gesture = BlinkGesture::from_count(self.window.len());
        if gesture.is_some() {
            self.window.clear();
        }
        gesture
    }

    pub fn update(&mut self, both_closed: bool, now_ms: u64) -> Option<BlinkGesture> {
        self.forget_after_gap(now_ms);
        match self.policy {
            DispatchPolicy::Immediate => {
                self.record(both_closed, now_ms);
                self.prune(now_ms);
                self.take()
            }
            DispatchPolicy::Settled => {
                // The episode closes when its first blink would age out; this
                // frame's blink, if any, opens the next one.
                let closed = self
                    .window
                    .front()
                    .is_some_and(|&t| now_ms.saturating_sub(t) >= self.window_ms);
                let gesture = if closed { self.take() } else { None };
                self.record(both_closed, now_ms);
                self.prune(now_ms);
                gesture
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME_MS: u64 = 33;

    fn settled() -> BlinkAggregator {
        BlinkAggregator::new(300, 1200, DispatchPolicy::Settled)
    }

    /// Drive 30fps frames from 0 to `end` with BothClosed at the given
    /// instants (each pulse one frame long).
    fn run(agg: &mut BlinkAggregator, pulses: &[u64], end: u64) -> Vec<(u64, BlinkGesture)> {
        let mut out = vec![];
        let mut t = 0;
        while t <= end {
            let closed = pulses.iter().any(|&p| t >= p && t < p + FRAME_MS);
            if let Some(g) = agg.update(closed, t) {
                out.push((t, g));
            }
            t += FRAME_MS;
        }
        out
    }

    #[test]
    fn maps_counts_first_match() {
        assert_eq!(BlinkGesture::from_count(0), None);
        assert_eq!(BlinkGesture::from_count(1), Some(BlinkGesture::Click));
        assert_eq!(BlinkGesture::from_count(2), Some(BlinkGesture::DoubleClick));
        assert_eq!(BlinkGesture::from_count(3), Some(BlinkGesture::TogglePause));
        assert_eq!(BlinkGesture::from_count(4), Some(BlinkGesture::RightClick));
        assert_eq!(BlinkGesture::from_count(9), Some(BlinkGesture::RightClick));
    }

    #[test]
    fn isolated_pulse_is_one_click() {
        let mut agg = settled();
        let fired = run(&mut agg, &[330], 4000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, BlinkGesture::Click);
        assert_eq!(agg.count(), 0);
    }

    #[test]
    fn two_pulses_are_one_double_click() {
        let mut agg = settled();
        let fired = run(&mut agg, &[330, 792], 4000);
        assert_eq!(
            fired.iter().map(|f| f.1).collect::<Vec<_>>(),
            vec![BlinkGesture::DoubleClick]
        );
        assert_eq!(agg.count(), 0);
    }

    #[test]
    fn three_pulses_toggle_and_four_right_click() {
        let mut agg = settled();
        let fired = run(&mut agg, &[0, 363, 726], 3000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, BlinkGesture::TogglePause);

        let mut agg = settled();
        let fired = run(&mut agg, &[0, 330, 660, 990], 3000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, BlinkGesture::RightClick);
    }

    #[test]
    fn pulses_inside_cooldown_are_one_blink() {
        let mut agg = settled();
        agg.update(true, 0);
        agg.update(true, 100);
        agg.update(true, 300);
        assert_eq!(agg.count(), 1);
        agg.update(true, 301);
        assert_eq!(agg.count(), 2);
    }

    #[test]
    fn blink_on_closing_frame_starts_next_episode() {
        let mut agg = settled();
        assert_eq!(agg.update(true, 0), None);
        assert_eq!(agg.update(true, 1200), Some(BlinkGesture::Click));
        assert_eq!(agg.count(), 1);
    }

    #[test]
    fn immediate_policy_fires_on_first_blink() {
        let mut agg = BlinkAggregator::new(300, 1200, DispatchPolicy::Immediate);
        let fired = run(&mut agg, &[330, 792], 4000);
        assert_eq!(
            fired.iter().map(|f| f.1).collect::<Vec<_>>(),
            vec![BlinkGesture::Click, BlinkGesture::Click]
        );
    }

    #[test]
    fn gap_longer_than_window_drops_pending_blinks() {
        let mut agg = settled();
        assert_eq!(agg.update(true, 0), None);
        assert_eq!(agg.count(), 1);
        assert_eq!(agg.update(false, 10_000), None);
        assert_eq!(agg.count(), 0);
    }

    #[test]
    fn blinks_expiring_without_eye_data_fire_nothing() {
        let mut agg = settled();
        agg.update(true, 0);
        let mut t = 33;
        while t < 2000 {
            agg.expire(t);
            t += FRAME_MS;
        }
        assert_eq!(agg.count(), 0);
        assert_eq!(agg.update(false, t), None);
    }

    #[test]
    fn short_gap_keeps_the_episode() {
        let mut agg = settled();
        agg.update(true, 0);
        agg.expire(500);
        assert_eq!(agg.update(false, 1200), Some(BlinkGesture::Click));
    }

    proptest! {
        #[test]
        fn window_stays_pruned_and_increasing(
            steps in proptest::collection::vec((1u64..400, any::<bool>()), 1..200),
            immediate in any::<bool>(),
        ) {
            let policy = if immediate { DispatchPolicy::Immediate } else { DispatchPolicy::Settled };
            let mut agg = BlinkAggregator::new(300, 1200, policy);
            let mut now = 0u64;
            for (dt, closed) in steps {
                now += dt;
                agg.update(closed, now);
                let ts: Vec<u64> = agg.timestamps().collect();
                for t in &ts {
                    prop_assert!(now - t < 1200);
                }
                for pair in ts.windows(2) {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }
    }
}

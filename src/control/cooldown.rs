/// "Last fired + minimum interval" rate limiter.
#[derive(Debug, Clone)]
pub struct Cooldown {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl Cooldown {
    /// Ready immediately.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// Treated as if it fired at `at_ms`, so it first opens one interval later.
    pub fn armed_at(interval_ms: u64, at_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: Some(at_ms),
        }
    }

    /// Strictly more than the interval must have elapsed.
    pub fn ready(&self, now_ms: u64) -> bool {
        match self.last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.interval_ms,
        }
    }

    pub fn fire(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Fires and returns true if ready; otherwise leaves the timer untouched.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        if self.ready(now_ms) {
            self.fire(now_ms);
            true
        } else {
            false
        }
    }
}

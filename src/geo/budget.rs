use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Windowed ceiling on external geolocation calls.
///
/// The counter resets when the window elapses. It is not persisted across
/// restarts; it is a soft cap on provider traffic, not a correctness
/// guarantee. A unit is consumed before the provider attempt, so a failed
/// call still burns budget.
pub struct CallBudget {
    limit: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

struct WindowState {
    window_start: Instant,
    used: u32,
}

impl CallBudget {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Consume one unit of budget. Returns false when the window is exhausted.
    pub fn try_consume(&self) -> bool {
        self.try_consume_at(Instant::now())
    }

    /// Clock-injected variant so tests can drive the window deterministically.
    pub fn try_consume_at(&self, now: Instant) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            // A poisoned counter should never block resolution
            Err(poisoned) => poisoned.into_inner(),
        };

        if now.duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.used = 0;
        }

        if state.used >= self.limit {
            return false;
        }
        state.used += 1;
        true
    }

    /// Units consumed in the current window.
    pub fn used(&self) -> u32 {
        match self.state.lock() {
            Ok(state) => state.used,
            Err(poisoned) => poisoned.into_inner().used,
        }
    }
}

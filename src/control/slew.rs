// First-order slew-rate limiter.

/// Limits how fast a value may move: at most `rate_per_s * dt` per update,
/// symmetric in both directions. Callers supply the elapsed time so the
/// limiter stays deterministic under test.
#[derive(Debug, Clone)]
pub struct SlewRateLimiter {
    rate_per_s: f64,
    value: f64,
}

impl SlewRateLimiter {
    pub fn new(rate_per_s: f64) -> Self {
        Self {
            rate_per_s,
            value: 0.0,
        }
    }

    /// Step toward `target` and return the new limited value.
    pub fn calculate(&mut self, target: f64, dt_s: f64) -> f64 {
        let step = self.rate_per_s * dt_s;
        self.value += (target - self.value).clamp(-step, step);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Jump to a value without rate limiting (e.g. after a mode change).
    pub fn reset(&mut self, value: f64) {
        self.value = value;
    }
}

//! Cubic ease-out interpolation math.

use tokio::time::Duration;

/// Cubic ease-out curve: fast start, decelerating into the target.
///
/// `t` is clamped to `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

/// One in-flight interpolation from a start value toward a target.
#[derive(Debug, Clone)]
pub struct Tween {
    start_value: f64,
    target: f64,
    started_at: Duration,
    duration: Duration,
}

impl Tween {
    /// Begin a tween at `started_at` (clock time).
    pub fn new(start_value: f64, target: f64, started_at: Duration, duration: Duration) -> Self {
        Self {
            start_value,
            target,
            started_at,
            duration,
        }
    }

    /// The value the tween is heading toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Interpolated value at clock time `now`. Lands exactly on the target
    /// once the duration has elapsed.
    pub fn value_at(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return self.target;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.start_value + (self.target - self.start_value) * ease_out_cubic(t)
    }

    /// Whether the tween has run its full duration at clock time `now`.
    pub fn is_complete(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }
}

//! Frame scheduling abstraction.

use std::sync::{Arc, Mutex};
use tokio::time::Duration;

/// Cadence of the tokio-driven frame clock (~60fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A scheduled frame callback.
pub type FrameCallback = Box<dyn FnOnce() + Send>;

/// Handle to a scheduled frame; cancelling prevents the callback from firing.
pub struct FrameHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl FrameHandle {
    /// Wrap a cancellation action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the scheduled frame. Cancelling an already-fired frame is a
    /// no-op.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHandle").finish_non_exhaustive()
    }
}

/// Source of frame timing.
///
/// Production code uses [`TokioFrameClock`]; tests drive the deterministic
/// [`ManualFrameClock`] instead of real display frames.
pub trait FrameClock: Send + Sync + 'static {
    /// Time elapsed since the clock's epoch.
    fn now(&self) -> Duration;

    /// Schedule `cb` to run on the next frame.
    fn schedule_frame(&self, cb: FrameCallback) -> FrameHandle;
}

/// Frame clock driven by tokio timers at [`FRAME_INTERVAL`].
pub struct TokioFrameClock {
    epoch: tokio::time::Instant,
}

impl TokioFrameClock {
    /// Create a clock with its epoch at now.
    pub fn new() -> Self {
        Self {
            epoch: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioFrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for TokioFrameClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn schedule_frame(&self, cb: FrameCallback) -> FrameHandle {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(FRAME_INTERVAL).await;
            cb();
        });
        FrameHandle::new(move || handle.abort())
    }
}

struct ManualInner {
    now: Duration,
    next_seq: u64,
    pending: Vec<(u64, FrameCallback)>,
}

/// Deterministic frame clock for tests: frames fire only on [`advance`].
///
/// [`advance`]: ManualFrameClock::advance
#[derive(Clone)]
pub struct ManualFrameClock {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualFrameClock {
    /// Create a clock at time zero with no pending frames.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualInner {
                now: Duration::ZERO,
                next_seq: 0,
                pending: Vec::new(),
            })),
        }
    }

    /// Advance time by `dt` and fire every frame that was pending when the
    /// advance started. Callbacks scheduled by those frames wait for the
    /// next advance.
    pub fn advance(&self, dt: Duration) {
        let fired: Vec<FrameCallback> = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.now += dt;
            inner.pending.drain(..).map(|(_, cb)| cb).collect()
        };
        for cb in fired {
            cb();
        }
    }

    /// Number of frames currently scheduled.
    pub fn pending_frames(&self) -> usize {
        self.inner.lock().expect("lock poisoned").pending.len()
    }
}

impl Default for ManualFrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for ManualFrameClock {
    fn now(&self) -> Duration {
        self.inner.lock().expect("lock poisoned").now
    }

    fn schedule_frame(&self, cb: FrameCallback) -> FrameHandle {
        let seq = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.pending.push((seq, cb));
            seq
        };

        let inner = Arc::clone(&self.inner);
        FrameHandle::new(move || {
            let mut inner = inner.lock().expect("lock poisoned");
            inner.pending.retain(|(s, _)| *s != seq);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn manual_clock_advances_time() {
        let clock = ManualFrameClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(16));
    }

    #[test]
    fn manual_clock_fires_pending_on_advance() {
        let clock = ManualFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        clock.schedule_frame(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(clock.pending_frames(), 0);
    }

    #[test]
    fn cancelled_frame_never_fires() {
        let clock = ManualFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        let handle = clock.schedule_frame(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        handle.cancel();

        clock.advance(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn frame_scheduled_during_advance_waits_for_next_advance() {
        let clock = ManualFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let clock_clone = clock.clone();
        let fired_clone = fired.clone();
        clock.schedule_frame(Box::new(move || {
            let fired_inner = fired_clone.clone();
            clock_clone.schedule_frame(Box::new(move || {
                fired_inner.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        clock.advance(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(clock.pending_frames(), 1);

        clock.advance(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_fires_after_frame_interval() {
        let clock = TokioFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        clock.schedule_frame(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(FRAME_INTERVAL * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_cancel_aborts_frame() {
        let clock = TokioFrameClock::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        let handle = clock.schedule_frame(Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        handle.cancel();

        tokio::time::sleep(FRAME_INTERVAL * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

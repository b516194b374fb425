//! Frame-driven animators for displayed numeric values.

use crate::{FrameClock, FrameHandle, Tween};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::trace;

/// How an animator presents its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStyle {
    /// Whole-number display (XP totals, streak counts). Snaps straight to 0
    /// when retargeted to 0.
    Count,
    /// Percentage display; targets are clamped to 0..=100.
    Progress,
}

struct AnimatorInner {
    displayed: f64,
    tween: Option<Tween>,
    frame: Option<FrameHandle>,
}

struct AnimatorShared {
    clock: Arc<dyn FrameClock>,
    style: MotionStyle,
    inner: Mutex<AnimatorInner>,
    tx: watch::Sender<f64>,
}

/// Eases a displayed value toward a moving target.
///
/// At most one frame loop is scheduled per animator: retargeting cancels the
/// previous loop and restarts from the last displayed value, so the motion
/// never jumps back. Dropping the animator cancels any pending frame.
pub struct Animator {
    shared: Arc<AnimatorShared>,
}

impl Animator {
    /// Whole-number animator (XP counts, streak lengths).
    pub fn count(clock: Arc<dyn FrameClock>) -> Self {
        Self::new(clock, MotionStyle::Count)
    }

    /// Percentage animator (level progress bars).
    pub fn progress(clock: Arc<dyn FrameClock>) -> Self {
        Self::new(clock, MotionStyle::Progress)
    }

    fn new(clock: Arc<dyn FrameClock>, style: MotionStyle) -> Self {
        let (tx, _) = watch::channel(0.0);
        Self {
            shared: Arc::new(AnimatorShared {
                clock,
                style,
                inner: Mutex::new(AnimatorInner {
                    displayed: 0.0,
                    tween: None,
                    frame: None,
                }),
                tx,
            }),
        }
    }

    /// Current displayed value.
    pub fn value(&self) -> f64 {
        self.shared.inner.lock().expect("lock poisoned").displayed
    }

    /// Subscribe to displayed-value changes.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.shared.tx.subscribe()
    }

    /// Start easing toward `target` over `duration`.
    ///
    /// Cancels any in-flight motion and continues from the last displayed
    /// value. A count-style animator retargeted to 0 snaps immediately.
    pub fn retarget(&self, target: f64, duration: Duration) {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().expect("lock poisoned");

        if let Some(frame) = inner.frame.take() {
            frame.cancel();
        }

        let target = match shared.style {
            MotionStyle::Progress => target.clamp(0.0, 100.0),
            MotionStyle::Count => target,
        };

        // Zero fast-path: a count reset renders as 0 right away
        if shared.style == MotionStyle::Count && target == 0.0 {
            inner.displayed = 0.0;
            inner.tween = None;
            drop(inner);
            shared.tx.send_replace(0.0);
            return;
        }

        if duration.is_zero() || inner.displayed == target {
            inner.displayed = target;
            inner.tween = None;
            drop(inner);
            shared.tx.send_replace(target);
            return;
        }

        let start = inner.displayed;
        trace!(start, target, "Retargeting motion");
        inner.tween = Some(Tween::new(start, target, shared.clock.now(), duration));
        drop(inner);

        schedule_tick(shared);
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock().expect("lock poisoned");
        if let Some(frame) = inner.frame.take() {
            frame.cancel();
        }
        inner.tween = None;
    }
}

/// Schedule the next frame of the loop; the callback no-ops if the animator
/// has been dropped in the meantime.
fn schedule_tick(shared: &Arc<AnimatorShared>) {
    let weak: Weak<AnimatorShared> = Arc::downgrade(shared);
    let handle = shared.clock.schedule_frame(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            tick(&shared);
        }
    }));
    shared.inner.lock().expect("lock poisoned").frame = Some(handle);
}

fn tick(shared: &Arc<AnimatorShared>) {
    let now = shared.clock.now();
    let mut inner = shared.inner.lock().expect("lock poisoned");

    let Some(tween) = inner.tween.clone() else {
        inner.frame = None;
        return;
    };

    let done = tween.is_complete(now);
    inner.displayed = if done {
        tween.target()
    } else {
        match shared.style {
            MotionStyle::Count => tween.value_at(now).round(),
            MotionStyle::Progress => tween.value_at(now),
        }
    };
    let published = inner.displayed;

    if done {
        inner.tween = None;
        inner.frame = None;
    }
    drop(inner);

    shared.tx.send_replace(published);
    if !done {
        schedule_tick(shared);
    }
}

//! Smooth numeric motion for the Skillexa client.
//!
//! Server-reported numbers (XP totals, streak counts, level progress) are
//! not rendered directly; an [`Animator`] eases the displayed value toward
//! each new target with a cubic ease-out curve. Frame timing comes from a
//! [`FrameClock`], so the algorithm runs against real tokio timers in the
//! app and a deterministic [`ManualFrameClock`] in tests.

mod animator;
mod clock;
mod tween;

pub use animator::{Animator, MotionStyle};
pub use clock::{
    FrameCallback, FrameClock, FrameHandle, ManualFrameClock, TokioFrameClock, FRAME_INTERVAL,
};
pub use tween::{ease_out_cubic, Tween};

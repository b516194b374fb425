//! Ephemeral toast notifications for the Skillexa client.
//!
//! Toasts are queued with a monotonic id, auto-expire on their own timer
//! (default 5 seconds), and can be removed early. Views subscribe to the
//! queue through a watch channel and render whatever is currently in it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;

/// Default time a toast stays queued before auto-expiring.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Kind of toast, driving the view's styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    /// XP award; carries an amount.
    Xp,
}

/// A queued toast.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Monotonic id, unique among queued toasts.
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    /// XP amount for [`ToastKind::Xp`] toasts.
    pub amount: Option<i64>,
    /// How long the toast stays queued.
    pub duration: Duration,
    pub created_at: DateTime<Utc>,
}

/// A toast waiting to be pushed.
#[derive(Debug, Clone)]
pub struct ToastRequest {
    kind: ToastKind,
    message: String,
    amount: Option<i64>,
    duration: Duration,
}

impl ToastRequest {
    fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            amount: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    /// A success toast.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    /// An error toast.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    /// An informational toast.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, message)
    }

    /// An XP award toast.
    pub fn xp(message: impl Into<String>, amount: i64) -> Self {
        let mut request = Self::new(ToastKind::Xp, message);
        request.amount = Some(amount);
        request
    }

    /// Override the auto-expiry duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

struct ToastCenterInner {
    toasts: Vec<Toast>,
    timers: HashMap<u64, JoinHandle<()>>,
}

/// The toast queue.
///
/// Lives in an `Arc` because each pushed toast spawns its own expiry task
/// holding a weak reference back to the center.
pub struct ToastCenter {
    next_id: AtomicU64,
    inner: Mutex<ToastCenterInner>,
    tx: watch::Sender<Vec<Toast>>,
}

impl ToastCenter {
    /// Create a new empty toast center.
    pub fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            inner: Mutex::new(ToastCenterInner {
                toasts: Vec::new(),
                timers: HashMap::new(),
            }),
            tx,
        })
    }

    /// Queue a toast and schedule its expiry. Returns the toast id.
    pub fn push(self: &Arc<Self>, request: ToastRequest) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let duration = request.duration;
        let toast = Toast {
            id,
            kind: request.kind,
            message: request.message,
            amount: request.amount,
            duration,
            created_at: Utc::now(),
        };

        let weak: Weak<Self> = Arc::downgrade(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(center) = weak.upgrade() {
                debug!(id, "Toast expired");
                center.remove(id);
            }
        });

        {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.toasts.push(toast);
            inner.timers.insert(id, timer);
            self.tx.send_replace(inner.toasts.clone());
        }

        id
    }

    /// Remove a toast early, cancelling its expiry timer. Removing an
    /// unknown id is a no-op.
    pub fn remove(&self, id: u64) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if let Some(timer) = inner.timers.remove(&id) {
            timer.abort();
        }
        let before = inner.toasts.len();
        inner.toasts.retain(|toast| toast.id != id);
        if inner.toasts.len() != before {
            self.tx.send_replace(inner.toasts.clone());
        }
    }

    /// Snapshot of the queued toasts, in insertion order.
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.lock().expect("lock poisoned").toasts.clone()
    }

    /// Subscribe to queue changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.tx.subscribe()
    }
}

impl Drop for ToastCenter {
    fn drop(&mut self) {
        let inner = self.inner.lock().expect("lock poisoned");
        for timer in inner.timers.values() {
            timer.abort();
        }
    }
}

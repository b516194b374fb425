//! Global refresh broadcast for the Skillexa client.
//!
//! A shared monotonic counter lets unrelated components request that others
//! re-poll: triggering increments the counter and fans the new value out to
//! every subscriber. The bus carries no payload beyond the counter; each
//! subscriber decides what "refresh" means (typically calling its own
//! poller's `refresh()`).

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the broadcast channel. Subscribers that fall further behind
/// than this see a lag error and should re-read `current()`.
const CHANNEL_CAPACITY: usize = 16;

/// Broadcast counter for cross-component refresh requests.
///
/// The counter only increases and never resets while the process is alive.
pub struct RefreshBus {
    counter: AtomicU64,
    tx: broadcast::Sender<u64>,
}

impl RefreshBus {
    /// Create a new bus with the counter at zero.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            counter: AtomicU64::new(0),
            tx,
        }
    }

    /// Request a refresh: increment the counter and notify subscribers.
    ///
    /// Returns the new counter value.
    pub fn trigger(&self) -> u64 {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Refresh requested");
        // Send fails only when there are no subscribers, which is fine
        let _ = self.tx.send(generation);
        generation
    }

    /// Current counter value.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Subscribe to future refresh requests.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_zero() {
        let bus = RefreshBus::new();
        assert_eq!(bus.current(), 0);
    }

    #[test]
    fn trigger_increments_monotonically() {
        let bus = RefreshBus::new();

        assert_eq!(bus.trigger(), 1);
        assert_eq!(bus.trigger(), 2);
        assert_eq!(bus.trigger(), 3);
        assert_eq!(bus.current(), 3);
    }

    #[tokio::test]
    async fn subscribers_receive_each_trigger() {
        let bus = RefreshBus::new();
        let mut rx = bus.subscribe();

        bus.trigger();
        bus.trigger();

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn multiple_subscribers_all_notified() {
        let bus = RefreshBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.trigger();

        assert_eq!(rx1.recv().await.unwrap(), 1);
        assert_eq!(rx2.recv().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_later_values() {
        let bus = RefreshBus::new();
        bus.trigger();
        bus.trigger();

        let mut rx = bus.subscribe();
        bus.trigger();

        assert_eq!(rx.recv().await.unwrap(), 3);
        assert_eq!(bus.current(), 3);
    }

    #[test]
    fn trigger_without_subscribers_does_not_panic() {
        let bus = RefreshBus::new();
        assert_eq!(bus.trigger(), 1);
    }
}

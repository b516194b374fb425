//! Interval polling engine for the Skillexa client.
//!
//! A [`Poller`] owns one piece of remote state: it fetches immediately on
//! spawn, refetches every interval, and exposes
//! `{data, loading, error, last_updated, is_refreshing}` to views through a
//! watch channel. Previously fetched data stays visible while a background
//! refresh is in flight (stale-while-revalidate), and stays visible when a
//! refresh fails (stale-while-error).
//!
//! # Overlapping fetches
//!
//! A manual [`refresh`](Poller::refresh) can race an outstanding interval
//! fetch, and the two can complete out of order. Every issued fetch is
//! tagged with a monotonically increasing generation; a completion whose
//! generation is not the latest issued is discarded, so the displayed data
//! always reflects the most recently *issued* request.
//!
//! # Hung requests
//!
//! No timeout is imposed here: a hung request leaves `loading` or
//! `is_refreshing` up until it settles. Accepted gap.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Capacity of the handle-to-loop command queue.
const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Capacity of the fetch completion queue.
const COMPLETION_QUEUE_CAPACITY: usize = 16;

/// Error type produced by a caller-supplied remote read.
pub type ReadError = Box<dyn std::error::Error + Send + Sync>;

/// Signal that the owning poller has shut down.
///
/// Handed to every [`RemoteRead::read`] call so implementations can abort
/// in-flight requests instead of running them to completion for a result
/// nobody will apply.
#[derive(Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// Whether the owning poller has shut down.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the owning poller shuts down.
    pub async fn cancelled(mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            // Sender dropped means the poller is gone too
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// A token that never fires, for tests and direct source calls.
    pub fn never() -> Self {
        static NEVER: std::sync::OnceLock<watch::Sender<bool>> = std::sync::OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        Self { rx: tx.subscribe() }
    }
}

/// A caller-supplied remote read.
pub trait RemoteRead<T>: Send + Sync {
    /// Fetch the current remote value.
    fn read(&self, cancel: Cancellation) -> BoxFuture<'static, Result<T, ReadError>>;
}

impl<T, F> RemoteRead<T> for F
where
    F: Fn(Cancellation) -> BoxFuture<'static, Result<T, ReadError>> + Send + Sync,
{
    fn read(&self, cancel: Cancellation) -> BoxFuture<'static, Result<T, ReadError>> {
        self(cancel)
    }
}

/// Observable state of one poller.
#[derive(Debug, Clone)]
pub struct PollState<T> {
    /// Most recently fetched value; retained across failed refreshes.
    pub data: Option<T>,
    /// True only while the very first fetch (no data yet) is in flight.
    pub loading: bool,
    /// Display message of the last failure; cleared on the next success.
    pub error: Option<String>,
    /// When `data` was last replaced.
    pub last_updated: Option<DateTime<Utc>>,
    /// True while a background or manual refresh is in flight.
    pub is_refreshing: bool,
}

impl<T> PollState<T> {
    fn initial(initial_data: Option<T>, enabled: bool) -> Self {
        // The first fetch is issued immediately on spawn (when enabled), so
        // the initial snapshot already reports it
        let loading = initial_data.is_none() && enabled;
        Self {
            data: initial_data,
            loading,
            error: None,
            last_updated: None,
            is_refreshing: false,
        }
    }
}

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig<T> {
    /// How often to refetch.
    pub interval: Duration,
    /// Whether interval ticking starts enabled.
    pub enabled: bool,
    /// Value to display before the first fetch completes.
    pub initial_data: Option<T>,
}

impl<T> Default for PollerConfig<T> {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            enabled: true,
            initial_data: None,
        }
    }
}

type OnSuccess<T> = Box<dyn Fn(&T) + Send + Sync>;
type OnError = Box<dyn Fn(&ReadError) + Send + Sync>;

/// Optional per-fetch callbacks.
pub struct PollerHooks<T> {
    on_success: Option<OnSuccess<T>>,
    on_error: Option<OnError>,
}

impl<T> PollerHooks<T> {
    /// No callbacks.
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }

    /// Called with each successfully fetched value.
    pub fn on_success(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Called with each fetch failure.
    pub fn on_error(mut self, f: impl Fn(&ReadError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl<T> Default for PollerHooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

enum Command {
    Refresh,
    SetEnabled(bool),
    Shutdown,
}

/// Handle to a running poll loop.
///
/// Dropping the handle shuts the loop down: the interval stops, in-flight
/// fetch tasks are aborted, and no state mutation happens afterwards.
pub struct Poller<T> {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PollState<T>>,
    cancel: watch::Sender<bool>,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    /// Spawn a poll loop over the given source.
    ///
    /// The first fetch is issued immediately; with no `initial_data` it is
    /// flagged `loading`, otherwise `is_refreshing`.
    pub fn spawn(
        source: Arc<dyn RemoteRead<T>>,
        config: PollerConfig<T>,
        hooks: PollerHooks<T>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(PollState::initial(
            config.initial_data.clone(),
            config.enabled,
        ));

        tokio::spawn(run_loop(
            source,
            config,
            hooks,
            state_tx,
            command_rx,
            Cancellation { rx: cancel_rx },
        ));

        Self {
            commands: command_tx,
            state: state_rx,
            cancel: cancel_tx,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.state.clone()
    }

    /// Force an immediate fetch outside the interval. Fire-and-forget; a
    /// full command queue drops the request.
    pub fn refresh(&self) {
        if let Err(err) = self.commands.try_send(Command::Refresh) {
            debug!(error = %err, "Refresh request dropped");
        }
    }

    /// Pause or resume interval ticking. Disabling never clears data.
    pub fn set_enabled(&self, enabled: bool) {
        if let Err(err) = self.commands.try_send(Command::SetEnabled(enabled)) {
            debug!(error = %err, "Enable request dropped");
        }
    }

    /// Stop the poll loop and abort in-flight fetches.
    pub fn shutdown(&self) {
        let _ = self.cancel.send(true);
        let _ = self.commands.try_send(Command::Shutdown);
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
        let _ = self.commands.try_send(Command::Shutdown);
    }
}

async fn run_loop<T: Clone + Send + Sync + 'static>(
    source: Arc<dyn RemoteRead<T>>,
    config: PollerConfig<T>,
    hooks: PollerHooks<T>,
    state: watch::Sender<PollState<T>>,
    mut commands: mpsc::Receiver<Command>,
    cancel: Cancellation,
) {
    let (completion_tx, mut completions) =
        mpsc::channel::<(u64, Result<T, ReadError>)>(COMPLETION_QUEUE_CAPACITY);

    let mut ticker = interval(config.interval);
    let mut enabled = config.enabled;
    let mut generation: u64 = 0;
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick(), if enabled => {
                issue_fetch(
                    &source,
                    &state,
                    &completion_tx,
                    &cancel,
                    &mut generation,
                    &mut in_flight,
                );
            }
            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(Command::Refresh) => {
                        issue_fetch(
                            &source,
                            &state,
                            &completion_tx,
                            &cancel,
                            &mut generation,
                            &mut in_flight,
                        );
                    }
                    Some(Command::SetEnabled(value)) => {
                        if value && !enabled {
                            // Restart the cadence instead of replaying
                            // ticks missed while disabled
                            ticker.reset();
                        }
                        debug!(enabled = value, "Poller enabled state changed");
                        enabled = value;
                    }
                    Some(Command::Shutdown) | None => break,
                }
            }
            Some((fetch_generation, outcome)) = completions.recv() => {
                apply_completion(fetch_generation, generation, outcome, &state, &hooks);
            }
        }
    }

    for handle in in_flight {
        handle.abort();
    }
    debug!("Poller stopped");
}

/// Issue one generation-tagged fetch as its own task.
fn issue_fetch<T: Clone + Send + Sync + 'static>(
    source: &Arc<dyn RemoteRead<T>>,
    state: &watch::Sender<PollState<T>>,
    completion_tx: &mpsc::Sender<(u64, Result<T, ReadError>)>,
    cancel: &Cancellation,
    generation: &mut u64,
    in_flight: &mut Vec<JoinHandle<()>>,
) {
    *generation += 1;
    let fetch_generation = *generation;

    state.send_modify(|s| {
        if s.data.is_none() {
            s.loading = true;
        } else {
            s.is_refreshing = true;
        }
    });

    let future = source.read(cancel.clone());
    let completion_tx = completion_tx.clone();
    let handle = tokio::spawn(async move {
        let outcome = future.await;
        // The loop may already be gone; nothing to do then
        let _ = completion_tx.send((fetch_generation, outcome)).await;
    });

    in_flight.retain(|h| !h.is_finished());
    in_flight.push(handle);
    debug!(generation = fetch_generation, "Issued fetch");
}

/// Apply a fetch completion, unless a newer fetch has been issued since.
fn apply_completion<T: Clone + Send + Sync + 'static>(
    fetch_generation: u64,
    latest_generation: u64,
    outcome: Result<T, ReadError>,
    state: &watch::Sender<PollState<T>>,
    hooks: &PollerHooks<T>,
) {
    if fetch_generation != latest_generation {
        debug!(
            generation = fetch_generation,
            latest = latest_generation,
            "Discarding stale fetch completion"
        );
        return;
    }

    match outcome {
        Ok(value) => {
            state.send_modify(|s| {
                s.data = Some(value.clone());
                s.error = None;
                s.last_updated = Some(Utc::now());
                s.loading = false;
                s.is_refreshing = false;
            });
            if let Some(f) = &hooks.on_success {
                f(&value);
            }
        }
        Err(err) => {
            warn!(error = %err, "Fetch failed, keeping stale data");
            state.send_modify(|s| {
                s.error = Some(err.to_string());
                s.loading = false;
                s.is_refreshing = false;
            });
            if let Some(f) = &hooks.on_error {
                f(&err);
            }
        }
    }
}

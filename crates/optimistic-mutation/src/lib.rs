//! Optimistic remote writes for the Skillexa client.
//!
//! A [`Mutation`] wraps a remote write with an optimistic local application
//! and a rollback path: `on_mutate` applies the assumed result before the
//! request goes out and hands back a [`RollbackContext`]; if the write
//! fails, the context's undo closure runs exactly once with the caller's
//! rollback data, the error is recorded, and the failure is re-raised so
//! the caller's UI can react (typically with an error toast).
//!
//! Two concurrent `mutate` calls race on whatever shared state the
//! callbacks touch; ordering discipline stays with the caller. This
//! component only guarantees that *its own* rollback fires exactly once per
//! failed call.

use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type produced by a caller-supplied remote write.
pub type WriteError = Box<dyn std::error::Error + Send + Sync>;

/// A caller-supplied remote write.
pub trait RemoteWrite<V, R>: Send + Sync {
    /// Perform the write with the given variables.
    fn write(&self, vars: V) -> BoxFuture<'static, Result<R, WriteError>>;
}

impl<V, R, F> RemoteWrite<V, R> for F
where
    F: Fn(V) -> BoxFuture<'static, Result<R, WriteError>> + Send + Sync,
{
    fn write(&self, vars: V) -> BoxFuture<'static, Result<R, WriteError>> {
        self(vars)
    }
}

/// Error returned to the caller when a mutation fails.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The remote write rejected; rollback (if any) has already run.
    #[error("Mutation failed: {0}")]
    Remote(String),
}

/// Observable mutation state, reset per call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationState {
    /// True only while the remote call is in flight.
    pub loading: bool,
    /// Display message of the last failure, if any.
    pub error: Option<String>,
}

/// Captures how to undo one optimistic application.
///
/// Returned by the caller's `on_mutate` callback; consumed (at most once)
/// by the failure path.
pub struct RollbackContext<B> {
    rollback: Box<dyn FnOnce(B) + Send>,
}

impl<B> RollbackContext<B> {
    /// Wrap an undo closure.
    pub fn new(rollback: impl FnOnce(B) + Send + 'static) -> Self {
        Self {
            rollback: Box::new(rollback),
        }
    }

    fn run(self, data: B) {
        (self.rollback)(data);
    }
}

impl<B> std::fmt::Debug for RollbackContext<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackContext").finish_non_exhaustive()
    }
}

/// Per-call optimistic and rollback payloads.
#[derive(Debug, Clone, Default)]
pub struct MutationScope<O, B> {
    /// Locally-assumed result, applied by `on_mutate` before the write.
    pub optimistic: Option<O>,
    /// Data handed to the rollback closure when the write fails.
    pub rollback: Option<B>,
}

impl<O, B> MutationScope<O, B> {
    /// Scope with both an optimistic value and rollback data.
    pub fn new(optimistic: O, rollback: B) -> Self {
        Self {
            optimistic: Some(optimistic),
            rollback: Some(rollback),
        }
    }

    /// Scope with neither payload (plain remote write).
    pub fn none() -> Self {
        Self {
            optimistic: None,
            rollback: None,
        }
    }
}

type OnMutate<V, O, B> =
    Box<dyn Fn(&V, Option<&O>) -> Option<RollbackContext<B>> + Send + Sync>;
type OnSuccess<V, R> = Box<dyn Fn(&R, &V) + Send + Sync>;
type OnError<V> = Box<dyn Fn(&WriteError, &V) + Send + Sync>;

/// A remote write with optimistic application and rollback.
pub struct Mutation<V, R, O = (), B = ()> {
    write: Arc<dyn RemoteWrite<V, R>>,
    on_mutate: Option<OnMutate<V, O, B>>,
    on_success: Option<OnSuccess<V, R>>,
    on_error: Option<OnError<V>>,
    state: Mutex<MutationState>,
}

impl<V, R, O, B> Mutation<V, R, O, B>
where
    V: Clone + Send,
{
    /// Create a mutation around a remote write.
    pub fn new(write: Arc<dyn RemoteWrite<V, R>>) -> Self {
        Self {
            write,
            on_mutate: None,
            on_success: None,
            on_error: None,
            state: Mutex::new(MutationState::default()),
        }
    }

    /// Register the optimistic-application callback. Its return value is
    /// the rollback context for this call.
    pub fn on_mutate(
        mut self,
        f: impl Fn(&V, Option<&O>) -> Option<RollbackContext<B>> + Send + Sync + 'static,
    ) -> Self {
        self.on_mutate = Some(Box::new(f));
        self
    }

    /// Register the success callback.
    pub fn on_success(mut self, f: impl Fn(&R, &V) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Register the failure callback. Runs after rollback.
    pub fn on_error(mut self, f: impl Fn(&WriteError, &V) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Snapshot of the mutation state.
    pub fn state(&self) -> MutationState {
        self.state.lock().expect("lock poisoned").clone()
    }

    /// Run the mutation: optimistic phase, remote write, confirm or roll
    /// back.
    pub async fn mutate(&self, vars: V, scope: MutationScope<O, B>) -> Result<R, MutationError> {
        let context = match &self.on_mutate {
            Some(f) => f(&vars, scope.optimistic.as_ref()),
            None => None,
        };

        {
            let mut state = self.state.lock().expect("lock poisoned");
            state.loading = true;
            state.error = None;
        }

        let outcome = self.write.write(vars.clone()).await;

        match outcome {
            Ok(result) => {
                self.state.lock().expect("lock poisoned").loading = false;
                debug!("Mutation confirmed");
                if let Some(f) = &self.on_success {
                    f(&result, &vars);
                }
                Ok(result)
            }
            Err(err) => {
                if let (Some(data), Some(context)) = (scope.rollback, context) {
                    debug!("Rolling back optimistic update");
                    context.run(data);
                }

                {
                    let mut state = self.state.lock().expect("lock poisoned");
                    state.loading = false;
                    state.error = Some(err.to_string());
                }

                warn!(error = %err, "Mutation failed");
                if let Some(f) = &self.on_error {
                    f(&err, &vars);
                }
                Err(MutationError::Remote(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn ok_write(value: i64) -> Arc<dyn RemoteWrite<i64, i64>> {
        Arc::new(move |vars: i64| -> BoxFuture<'static, Result<i64, WriteError>> {
            let result = value + vars;
            Box::pin(async move { Ok(result) })
        })
    }

    fn failing_write(message: &'static str) -> Arc<dyn RemoteWrite<i64, i64>> {
        Arc::new(move |_vars: i64| -> BoxFuture<'static, Result<i64, WriteError>> {
            Box::pin(async move { Err(WriteError::from(message)) })
        })
    }

    #[tokio::test]
    async fn success_resolves_with_result() {
        let mutation: Mutation<i64, i64> = Mutation::new(ok_write(100));

        let result = mutation.mutate(5, MutationScope::none()).await.unwrap();
        assert_eq!(result, 105);

        let state = mutation.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn success_invokes_on_success_with_vars() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();

        let mutation: Mutation<i64, i64> = Mutation::new(ok_write(1))
            .on_success(move |result, vars| {
                *seen_clone.lock().unwrap() = Some((*result, *vars));
            });

        mutation.mutate(2, MutationScope::none()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some((3, 2)));
    }

    #[tokio::test]
    async fn failure_rolls_back_to_previous_value() {
        // Local state the optimistic callback manipulates
        let local = Arc::new(Mutex::new(1i64));

        let local_for_mutate = local.clone();
        let mutation: Mutation<i64, i64, i64, i64> = Mutation::new(failing_write("boom"))
            .on_mutate(move |_vars, optimistic| {
                let local = local_for_mutate.clone();
                if let Some(value) = optimistic {
                    *local.lock().unwrap() = *value;
                }
                Some(RollbackContext::new(move |previous| {
                    *local.lock().unwrap() = previous;
                }))
            });

        let result = mutation.mutate(0, MutationScope::new(10, 1)).await;

        assert!(matches!(result, Err(MutationError::Remote(_))));
        assert_eq!(*local.lock().unwrap(), 1, "rollback restored previous value");
        assert_eq!(mutation.state().error, Some("boom".to_string()));
    }

    #[tokio::test]
    async fn rollback_fires_exactly_once() {
        let rollbacks = Arc::new(AtomicUsize::new(0));

        let rollbacks_clone = rollbacks.clone();
        let mutation: Mutation<i64, i64, i64, i64> = Mutation::new(failing_write("boom"))
            .on_mutate(move |_vars, _optimistic| {
                let counter = rollbacks_clone.clone();
                Some(RollbackContext::new(move |_data: i64| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
            });

        let _ = mutation.mutate(0, MutationScope::new(10, 1)).await;
        assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_rollback_without_rollback_data() {
        let rollbacks = Arc::new(AtomicUsize::new(0));

        let rollbacks_clone = rollbacks.clone();
        let mutation: Mutation<i64, i64, i64, i64> = Mutation::new(failing_write("boom"))
            .on_mutate(move |_vars, _optimistic| {
                let counter = rollbacks_clone.clone();
                Some(RollbackContext::new(move |_data: i64| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
            });

        let scope = MutationScope {
            optimistic: Some(10),
            rollback: None,
        };
        let result = mutation.mutate(0, scope).await;

        assert!(result.is_err());
        assert_eq!(rollbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_invokes_on_error_after_rollback() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_for_mutate = order.clone();
        let order_for_error = order.clone();
        let mutation: Mutation<i64, i64, i64, i64> = Mutation::new(failing_write("boom"))
            .on_mutate(move |_vars, _optimistic| {
                let order = order_for_mutate.clone();
                Some(RollbackContext::new(move |_data: i64| {
                    order.lock().unwrap().push("rollback");
                }))
            })
            .on_error(move |err, _vars| {
                assert_eq!(err.to_string(), "boom");
                order_for_error.lock().unwrap().push("on_error");
            });

        let _ = mutation.mutate(0, MutationScope::new(1, 1)).await;
        assert_eq!(*order.lock().unwrap(), vec!["rollback", "on_error"]);
    }

    #[tokio::test]
    async fn loading_true_only_during_remote_call() {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let release_rx = Arc::new(Mutex::new(Some(release_rx)));

        let write: Arc<dyn RemoteWrite<i64, i64>> = Arc::new(
            move |_vars: i64| -> BoxFuture<'static, Result<i64, WriteError>> {
                let rx = release_rx.lock().unwrap().take().expect("single call");
                Box::pin(async move {
                    let _ = rx.await;
                    Ok(1)
                })
            },
        );

        let mutation = Arc::new(
            Mutation::<i64, i64>::new(write).on_mutate(|_vars, _optimistic| {
                // Optimistic phase runs before loading flips on
                None
            }),
        );

        let task = {
            let mutation = mutation.clone();
            tokio::spawn(async move { mutation.mutate(0, MutationScope::none()).await })
        };

        // Let the mutate call reach the remote await
        tokio::task::yield_now().await;
        assert!(mutation.state().loading);

        release_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!mutation.state().loading);
    }

    #[tokio::test]
    async fn state_error_resets_on_next_call() {
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        let write: Arc<dyn RemoteWrite<i64, i64>> = Arc::new(
            move |_vars: i64| -> BoxFuture<'static, Result<i64, WriteError>> {
                let first = calls_clone.fetch_add(1, Ordering::SeqCst) == 0;
                Box::pin(async move {
                    if first {
                        Err(WriteError::from("boom"))
                    } else {
                        Ok(1)
                    }
                })
            },
        );

        let mutation = Mutation::<i64, i64>::new(write);

        let _ = mutation.mutate(0, MutationScope::none()).await;
        assert_eq!(mutation.state().error, Some("boom".to_string()));

        mutation.mutate(0, MutationScope::none()).await.unwrap();
        assert_eq!(mutation.state().error, None);
    }
}

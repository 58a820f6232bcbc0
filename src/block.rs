//! Synchronous bridge: block the calling thread until one task settles.

use crate::outcome::Outcome;
use crate::registry::{InvocationId, SubscriptionRegistry};
use crate::task::{Observer, Task};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use thiserror::Error;

/// Error returned by [`block_on`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AwaitError<E> {
    /// The task failed; the error is propagated verbatim.
    #[error("task failed: {0}")]
    Failed(E),
    /// The task reached its terminal state without ever producing a value
    /// or an error. A protocol violation by the task; unreachable for
    /// well-behaved producers.
    #[error("task completed without producing a value or an error")]
    Unknown,
}

struct WaitState<V, E> {
    outcome: Option<Outcome<V, E>>,
    done: bool,
}

/// Blocks the calling thread until `task` settles, returning its value or
/// error.
///
/// The subscription is retained in the [`SubscriptionRegistry`] for the
/// duration of the wait and released once the terminal signal arrives.
/// There is no timeout; blocking is indefinite.
pub fn block_on<T, V, E>(task: &T) -> Result<V, AwaitError<E>>
where
    T: Task<V, E> + ?Sized,
    V: Send + 'static,
    E: Send + 'static,
{
    let wait = Arc::new((
        Mutex::new(WaitState {
            outcome: None,
            done: false,
        }),
        Condvar::new(),
    ));

    let value_wait = Arc::clone(&wait);
    let error_wait = Arc::clone(&wait);
    let finish_wait = Arc::clone(&wait);
    let handle = task.subscribe(Observer::new(
        move |value| {
            let (state, _) = &*value_wait;
            let mut state = state.lock();
            if state.outcome.is_none() {
                state.outcome = Some(Outcome::Success(value));
            }
        },
        move |error| {
            let (state, signal) = &*error_wait;
            let mut state = state.lock();
            if state.outcome.is_none() {
                state.outcome = Some(Outcome::Failure(error));
            }
            state.done = true;
            signal.notify_one();
        },
        move || {
            let (state, signal) = &*finish_wait;
            let mut state = state.lock();
            state.done = true;
            signal.notify_one();
        },
    ));

    let id = InvocationId::next();
    let registry = SubscriptionRegistry::global();
    registry.begin(id);
    registry.insert(id, handle);
    trace_event!("block_on {id} waiting");

    let outcome = {
        let (state, signal) = &*wait;
        let mut state = state.lock();
        while !state.done {
            signal.wait(&mut state);
        }
        state.outcome.take()
    };
    registry.release(id);

    match outcome {
        Some(Outcome::Success(value)) => Ok(value),
        Some(Outcome::Failure(error)) => Err(AwaitError::Failed(error)),
        None => Err(AwaitError::Unknown),
    }
}

/// Blocking sugar for any task: `task.wait()`.
pub trait WaitExt<V, E> {
    /// Blocks until the task settles. See [`block_on`].
    fn wait(&self) -> Result<V, AwaitError<E>>;
}

impl<T, V, E> WaitExt<V, E> for T
where
    T: Task<V, E> + ?Sized,
    V: Send + 'static,
    E: Send + 'static,
{
    fn wait(&self) -> Result<V, AwaitError<E>> {
        block_on(self)
    }
}

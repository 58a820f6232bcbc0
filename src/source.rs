//! Trivial task constructors.
//!
//! These cover the degenerate producers a combinator crate needs in anger:
//! immediately-settling values and errors, the value-less completion, and
//! the task that never settles. Anything richer (I/O, timers, retries)
//! belongs to the task implementations outside this crate.

use crate::task::{AnyTask, CancelHandle};

/// A task that immediately succeeds with `value`.
#[must_use]
pub fn ready<V, E>(value: V) -> AnyTask<V, E>
where
    V: Send + 'static,
{
    AnyTask::new(move |observer| {
        observer.value(value);
        observer.finished();
        CancelHandle::noop()
    })
}

/// A task that immediately fails with `error`.
#[must_use]
pub fn fail<V, E>(error: E) -> AnyTask<V, E>
where
    E: Send + 'static,
{
    AnyTask::new(move |observer| {
        observer.error(error);
        CancelHandle::noop()
    })
}

/// A task that immediately finishes without producing a value.
///
/// This is a protocol-degenerate producer: `all` records no entry for it,
/// `any` collects no outcome from it, and [`block_on`](crate::block_on)
/// reports [`AwaitError::Unknown`](crate::AwaitError::Unknown).
#[must_use]
pub fn empty<V, E>() -> AnyTask<V, E> {
    AnyTask::new(|observer| {
        observer.finished();
        CancelHandle::noop()
    })
}

/// A task that never settles.
#[must_use]
pub fn never<V, E>() -> AnyTask<V, E> {
    AnyTask::new(|observer| {
        drop(observer);
        CancelHandle::noop()
    })
}

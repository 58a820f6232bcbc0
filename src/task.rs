//! The task boundary: one-shot producers, observer callbacks, cancellation.
//!
//! A [`Task`] starts work when subscribed and reports back through an
//! [`Observer`]: at most one value, then exactly one terminal signal
//! (`finished`, or an error standing alone). Callbacks may fire
//! synchronously during `subscribe` or later from any thread.
//!
//! [`AnyTask`] is the type-erased one-shot task every combinator returns.
//! It is built from a subscribe closure, mirroring how an aggregate task is
//! nothing more than "what happens when someone subscribes".

use parking_lot::Mutex;
use std::sync::Arc;

/// The callback bundle handed to a task on subscription.
///
/// At most one of `value`/`error` may be delivered per subscription;
/// `finished` is the terminal signal after a value (or standing alone for a
/// value-less completion). The terminal methods consume the observer, so the
/// type system rules out a second terminal call on the same observer.
pub struct Observer<V, E> {
    on_value: Box<dyn Fn(V) + Send>,
    on_error: Box<dyn FnOnce(E) + Send>,
    on_finished: Box<dyn FnOnce() + Send>,
}

impl<V, E> Observer<V, E> {
    /// Builds an observer from the three callbacks.
    #[must_use]
    pub fn new(
        on_value: impl Fn(V) + Send + 'static,
        on_error: impl FnOnce(E) + Send + 'static,
        on_finished: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            on_value: Box::new(on_value),
            on_error: Box::new(on_error),
            on_finished: Box::new(on_finished),
        }
    }

    /// Delivers a value. Non-terminal; must be followed by [`finished`](Self::finished).
    pub fn value(&self, value: V) {
        (self.on_value)(value);
    }

    /// Delivers an error. Terminal.
    pub fn error(self, error: E) {
        (self.on_error)(error);
    }

    /// Signals completion. Terminal.
    pub fn finished(self) {
        (self.on_finished)();
    }
}

impl<V, E> std::fmt::Debug for Observer<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

/// Idempotent release of one subscription.
///
/// `cancel` runs the registered release closure at most once. Dropping a
/// handle does **not** cancel the subscription; the underlying task keeps
/// running and its callbacks keep firing.
pub struct CancelHandle {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl CancelHandle {
    /// Creates a handle that runs `release` on the first `cancel` call.
    #[must_use]
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Creates a handle with nothing to release.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            release: Mutex::new(None),
        }
    }

    /// Cancels the subscription. Idempotent; no-op after the first call.
    pub fn cancel(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("armed", &self.release.lock().is_some())
            .finish()
    }
}

/// A one-shot asynchronous producer.
///
/// Contract: work starts on `subscribe`; the observer receives at most one
/// value followed by exactly one terminal signal, possibly synchronously
/// during `subscribe`, possibly from another thread.
pub trait Task<V, E>: Send + Sync {
    /// Starts the task, reporting to `observer`. Returns the cancellation
    /// handle for this subscription.
    fn subscribe(&self, observer: Observer<V, E>) -> CancelHandle;
}

impl<V, E, T: Task<V, E> + ?Sized> Task<V, E> for Arc<T> {
    fn subscribe(&self, observer: Observer<V, E>) -> CancelHandle {
        (**self).subscribe(observer)
    }
}

type SubscribeFn<V, E> = Box<dyn FnOnce(Observer<V, E>) -> CancelHandle + Send>;

/// A type-erased one-shot task built from a subscribe closure.
///
/// This is the uniform return type of every combinator and source
/// constructor. The backing closure is consumed by the first subscription;
/// subscribing a second time is a contract violation and panics.
pub struct AnyTask<V, E> {
    start: Mutex<Option<SubscribeFn<V, E>>>,
}

impl<V, E> AnyTask<V, E> {
    /// Wraps a subscribe closure as a task.
    #[must_use]
    pub fn new(start: impl FnOnce(Observer<V, E>) -> CancelHandle + Send + 'static) -> Self {
        Self {
            start: Mutex::new(Some(Box::new(start))),
        }
    }
}

impl<V, E> Task<V, E> for AnyTask<V, E> {
    fn subscribe(&self, observer: Observer<V, E>) -> CancelHandle {
        let Some(start) = self.start.lock().take() else {
            panic!("one-shot task subscribed more than once");
        };
        start(observer)
    }
}

impl<V, E> std::fmt::Debug for AnyTask<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyTask")
            .field("subscribed", &self.start.lock().is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn observer_delivers_value_then_finished() {
        let values = Arc::new(Mutex::new(Vec::new()));
        let finishes = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&values);
        let done = Arc::clone(&finishes);
        let observer: Observer<i32, ()> = Observer::new(
            move |v| sink.lock().push(v),
            |()| {},
            move || {
                done.fetch_add(1, Ordering::SeqCst);
            },
        );
        observer.value(7);
        observer.finished();
        assert_eq!(*values.lock(), vec![7]);
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_handle_is_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        handle.cancel();
        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_handle_cancels_quietly() {
        let handle = CancelHandle::noop();
        handle.cancel();
        handle.cancel();
    }

    #[test]
    fn any_task_runs_subscribe_closure() {
        let task: AnyTask<i32, ()> = AnyTask::new(|observer| {
            observer.value(3);
            observer.finished();
            CancelHandle::noop()
        });
        let got = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&got);
        task.subscribe(Observer::new(move |v| *sink.lock() = Some(v), |()| {}, || {}));
        assert_eq!(*got.lock(), Some(3));
    }

    #[test]
    #[should_panic(expected = "subscribed more than once")]
    fn any_task_rejects_second_subscribe() {
        let task: AnyTask<i32, ()> = AnyTask::new(|_| CancelHandle::noop());
        task.subscribe(Observer::new(|_| {}, |()| {}, || {}));
        task.subscribe(Observer::new(|_| {}, |()| {}, || {}));
    }
}

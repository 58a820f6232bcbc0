//! Shared fixtures for unit tests.

use crate::task::{CancelHandle, Observer, Task};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A task settled by hand from the test body, for deterministic
/// completion-order scenarios without threads.
pub(crate) struct ManualTask<V, E> {
    observer: Mutex<Option<Observer<V, E>>>,
    cancelled: Arc<AtomicBool>,
    subscribed: AtomicBool,
}

impl<V: Send + 'static, E: Send + 'static> ManualTask<V, E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            observer: Mutex::new(None),
            cancelled: Arc::new(AtomicBool::new(false)),
            subscribed: AtomicBool::new(false),
        })
    }

    pub(crate) fn succeed(&self, value: V) {
        if let Some(observer) = self.observer.lock().take() {
            observer.value(value);
            observer.finished();
        }
    }

    pub(crate) fn fail(&self, error: E) {
        if let Some(observer) = self.observer.lock().take() {
            observer.error(error);
        }
    }

    pub(crate) fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<V: Send + 'static, E: Send + 'static> Task<V, E> for ManualTask<V, E> {
    fn subscribe(&self, observer: Observer<V, E>) -> CancelHandle {
        self.subscribed.store(true, Ordering::SeqCst);
        *self.observer.lock() = Some(observer);
        let cancelled = Arc::clone(&self.cancelled);
        CancelHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

/// Records everything an aggregate task emits.
pub(crate) struct Probe<V, E> {
    values: Mutex<Vec<V>>,
    errors: Mutex<Vec<E>>,
    finishes: AtomicUsize,
}

impl<V: Send + 'static, E: Send + 'static> Probe<V, E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            finishes: AtomicUsize::new(0),
        })
    }

    pub(crate) fn observer(self: &Arc<Self>) -> Observer<V, E> {
        let on_value = Arc::clone(self);
        let on_error = Arc::clone(self);
        let on_finished = Arc::clone(self);
        Observer::new(
            move |value| on_value.values.lock().push(value),
            move |error| on_error.errors.lock().push(error),
            move || {
                on_finished.finishes.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    pub(crate) fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.values.lock().clone()
    }

    pub(crate) fn errors(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.errors.lock().clone()
    }

    pub(crate) fn finish_count(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }
}

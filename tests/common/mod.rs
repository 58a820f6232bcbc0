//! Shared fixtures for the end-to-end suites: thread-backed delayed tasks,
//! a concurrency gauge, and an emission recorder.

#![allow(dead_code)]

use settle::{AnyTask, CancelHandle, Observer, Outcome};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A task that settles with `outcome` on its own thread after `delay`.
/// Cancellation suppresses the settlement.
pub fn delayed<V, E>(delay: Duration, outcome: Outcome<V, E>) -> AnyTask<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    AnyTask::new(move |observer| {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            thread::sleep(delay);
            if flag.load(Ordering::SeqCst) {
                return;
            }
            match outcome {
                Outcome::Success(value) => {
                    observer.value(value);
                    observer.finished();
                }
                Outcome::Failure(error) => observer.error(error),
            }
        });
        CancelHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    })
}

/// A task that finishes without a value after `delay`.
pub fn delayed_empty<V, E>(delay: Duration) -> AnyTask<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    AnyTask::new(move |observer| {
        thread::spawn(move || {
            thread::sleep(delay);
            observer.finished();
        });
        CancelHandle::noop()
    })
}

/// High-water mark of simultaneously live subscriptions.
#[derive(Default)]
pub struct ConcurrencyGauge {
    live: AtomicUsize,
    high: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn high_water(&self) -> usize {
        self.high.load(Ordering::SeqCst)
    }
}

/// A delayed success that tracks its live window on `gauge`.
pub fn gauged(gauge: &Arc<ConcurrencyGauge>, delay: Duration, value: i32) -> AnyTask<i32, ()> {
    let gauge = Arc::clone(gauge);
    AnyTask::new(move |observer| {
        let live = gauge.live.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.high.fetch_max(live, Ordering::SeqCst);
        thread::spawn(move || {
            thread::sleep(delay);
            gauge.live.fetch_sub(1, Ordering::SeqCst);
            observer.value(value);
            observer.finished();
        });
        CancelHandle::noop()
    })
}

/// Records everything an aggregate task emits.
pub struct Record<V, E> {
    values: Mutex<Vec<V>>,
    errors: Mutex<Vec<E>>,
    finishes: AtomicUsize,
}

impl<V: Send + 'static, E: Send + 'static> Record<V, E> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            finishes: AtomicUsize::new(0),
        })
    }

    pub fn observer(self: &Arc<Self>) -> Observer<V, E> {
        let on_value = Arc::clone(self);
        let on_error = Arc::clone(self);
        let on_finished = Arc::clone(self);
        Observer::new(
            move |value| on_value.values.lock().unwrap().push(value),
            move |error| on_error.errors.lock().unwrap().push(error),
            move || {
                on_finished.finishes.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.values.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.errors.lock().unwrap().clone()
    }

    pub fn finish_count(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }
}

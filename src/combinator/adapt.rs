//! Internal branch adapters for the fixed-arity combinators.
//!
//! The 2/3/4-ary forms of `all` and `any` are thin wrappers over the N-ary
//! core: each branch is erased into a branch-tagged union, aggregated
//! homogeneously, and projected back to a tuple. These adapters do that
//! erasure. They are not a stream-transformation API and stay private.

use crate::outcome::Outcome;
use crate::task::{AnyTask, Observer, Task};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::Arc;

struct MapCell<V2, E2, F> {
    observer: Option<Observer<V2, E2>>,
    map_value: Option<F>,
}

/// Maps a task's value and error into another space.
///
/// The value mapping may refuse (`None`), in which case the subscription
/// goes silent: nothing is ever emitted downstream. That mirrors the
/// projection guards of the fixed-arity forms, which must not fabricate a
/// tuple from a protocol-violating branch.
pub(crate) fn map<T, V, E, V2, E2, F, G>(task: T, map_value: F, map_error: G) -> AnyTask<V2, E2>
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
    V2: Send + 'static,
    E2: Send + 'static,
    F: FnOnce(V) -> Option<V2> + Send + 'static,
    G: FnOnce(E) -> E2 + Send + 'static,
{
    AnyTask::new(move |observer| {
        let cell = Arc::new(Mutex::new(MapCell {
            observer: Some(observer),
            map_value: Some(map_value),
        }));
        let value_cell = Arc::clone(&cell);
        let error_cell = Arc::clone(&cell);
        let finish_cell = cell;
        task.subscribe(Observer::new(
            move |value| {
                let (observer, mapped) = {
                    let mut cell = value_cell.lock();
                    let Some(map_value) = cell.map_value.take() else {
                        return;
                    };
                    match map_value(value) {
                        Some(mapped) => (cell.observer.take(), mapped),
                        // Projection refused: drop the observer, emit nothing.
                        None => {
                            cell.observer.take();
                            return;
                        }
                    }
                };
                // Downstream runs with the cell unlocked. The slot is empty
                // only while the producer is inside this value delivery; the
                // terminal signal is sequenced after it and finds the
                // observer restored.
                if let Some(observer) = observer {
                    observer.value(mapped);
                    value_cell.lock().observer = Some(observer);
                }
            },
            move |error| {
                let observer = error_cell.lock().observer.take();
                if let Some(observer) = observer {
                    observer.error(map_error(error));
                }
            },
            move || {
                let observer = finish_cell.lock().observer.take();
                if let Some(observer) = observer {
                    observer.finished();
                }
            },
        ))
    })
}

struct CaptureCell<W, F> {
    observer: Option<Observer<W, Infallible>>,
    wrap: Option<F>,
}

/// Turns a fallible task into an infallible one producing its [`Outcome`],
/// tagged through `wrap`.
///
/// A branch error becomes a successful emission downstream; only a branch
/// that finishes without ever settling leaves the slot unwritten.
pub(crate) fn capture<T, V, E, W, F>(task: T, wrap: F) -> AnyTask<W, Infallible>
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
    W: Send + 'static,
    F: FnOnce(Outcome<V, E>) -> W + Send + 'static,
{
    AnyTask::new(move |observer| {
        let cell = Arc::new(Mutex::new(CaptureCell {
            observer: Some(observer),
            wrap: Some(wrap),
        }));
        let value_cell = Arc::clone(&cell);
        let error_cell = Arc::clone(&cell);
        let finish_cell = cell;
        task.subscribe(Observer::new(
            move |value| {
                let (observer, wrap) = {
                    let mut cell = value_cell.lock();
                    let Some(wrap) = cell.wrap.take() else {
                        return;
                    };
                    (cell.observer.take(), wrap)
                };
                // Downstream runs with the cell unlocked; the terminal
                // signal is sequenced after the value delivery and finds
                // the observer restored.
                if let Some(observer) = observer {
                    observer.value(wrap(Outcome::Success(value)));
                    value_cell.lock().observer = Some(observer);
                }
            },
            move |error| {
                let (observer, wrap) = {
                    let mut cell = error_cell.lock();
                    (cell.observer.take(), cell.wrap.take())
                };
                if let (Some(observer), Some(wrap)) = (observer, wrap) {
                    observer.value(wrap(Outcome::Failure(error)));
                    observer.finished();
                }
            },
            move || {
                let observer = finish_cell.lock().observer.take();
                if let Some(observer) = observer {
                    observer.finished();
                }
            },
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source;
    use crate::test_util::{ManualTask, Probe};

    #[test]
    fn map_rewrites_values_and_errors() {
        let task = map(source::ready::<i32, i32>(5), |v| Some(v * 2), |e| e - 1);
        let probe = Probe::new();
        task.subscribe(probe.observer());
        assert_eq!(probe.values(), vec![10]);
        assert_eq!(probe.finish_count(), 1);

        let task = map(source::fail::<i32, i32>(5), |v| Some(v * 2), |e| e - 1);
        let probe = Probe::new();
        task.subscribe(probe.observer());
        assert_eq!(probe.errors(), vec![4]);
    }

    #[test]
    fn map_refusal_goes_silent() {
        let task = map(source::ready::<i32, ()>(5), |_| None::<i32>, |()| ());
        let probe = Probe::new();
        task.subscribe(probe.observer());
        assert!(probe.values().is_empty());
        assert_eq!(probe.finish_count(), 0);
    }

    #[test]
    fn capture_turns_failure_into_data() {
        let task = capture(source::fail::<i32, &str>("bad"), |outcome| outcome);
        let probe = Probe::new();
        task.subscribe(probe.observer());
        assert_eq!(probe.values(), vec![Outcome::Failure("bad")]);
        assert_eq!(probe.finish_count(), 1);
    }

    #[test]
    fn capture_passes_success_through() {
        let task = capture(source::ready::<i32, &str>(3), |outcome| outcome);
        let probe = Probe::new();
        task.subscribe(probe.observer());
        assert_eq!(probe.values(), vec![Outcome::Success(3)]);
        assert_eq!(probe.finish_count(), 1);
    }

    // The value arms hand the observer back after delivering downstream;
    // a terminal arriving as a separate callback must still find it.

    #[test]
    fn map_terminal_lands_after_a_delivered_value() {
        let manual = ManualTask::<i32, i32>::new();
        let task = map(manual.clone(), |v| Some(v + 1), |e: i32| e);
        let probe = Probe::new();
        task.subscribe(probe.observer());

        manual.succeed(4);
        assert_eq!(probe.values(), vec![5]);
        assert_eq!(probe.finish_count(), 1);
    }

    #[test]
    fn capture_terminal_lands_after_a_delivered_value() {
        let manual = ManualTask::<i32, &str>::new();
        let task = capture(manual.clone(), |outcome| outcome);
        let probe = Probe::new();
        task.subscribe(probe.observer());

        manual.succeed(2);
        assert_eq!(probe.values(), vec![Outcome::Success(2)]);
        assert_eq!(probe.finish_count(), 1);
    }
}

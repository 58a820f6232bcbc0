//! `all`: fail-fast join of N tasks.

use crate::either::{Either2, Either3, Either4};
use crate::registry::{InvocationId, SubscriptionRegistry};
use crate::task::{AnyTask, CancelHandle, Observer, Task};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use super::adapt;

/// Per-invocation aggregation state.
///
/// The observer slot is the settlement cell: `None` means the invocation
/// has emitted (or was cancelled) and every later callback is a no-op.
struct AllState<T, V, E> {
    observer: Option<Observer<Vec<V>, E>>,
    /// Index-keyed because tasks settle out of order; read back sorted.
    results: BTreeMap<usize, V>,
    /// Tasks that have not reached a terminal state.
    remaining: usize,
    /// Unstarted tasks, in input order.
    queue: VecDeque<(usize, T)>,
    in_flight: usize,
    window: usize,
    /// Single-drainer guard: `true` while one frame owns the start loop.
    draining: bool,
}

enum Step<V, E> {
    Emit(Observer<Vec<V>, E>, Vec<V>),
    Refill,
    Idle,
}

/// Runs every task, emitting either the values of all of them in input
/// index order, or the first failure observed — whichever happens first.
///
/// All tasks are subscribed eagerly. Zero tasks emit an empty vector
/// immediately.
#[must_use]
pub fn all<T, V, E>(tasks: Vec<T>) -> AnyTask<Vec<V>, E>
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    all_limit(tasks, 0)
}

/// [`all`] with at most `max_concurrent` tasks subscribed simultaneously.
///
/// The task list acts as a queue: each completion refills the window with
/// the next unstarted task, unless a failure has already settled the
/// invocation. `max_concurrent` of zero, or at least the list length,
/// degrades to the unbounded form.
#[must_use]
pub fn all_limit<T, V, E>(tasks: Vec<T>, max_concurrent: usize) -> AnyTask<Vec<V>, E>
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    AnyTask::new(move |observer| {
        let total = tasks.len();
        if total == 0 {
            observer.value(Vec::new());
            observer.finished();
            return CancelHandle::noop();
        }
        let window = if max_concurrent == 0 || max_concurrent >= total {
            total
        } else {
            max_concurrent
        };

        let id = InvocationId::next();
        SubscriptionRegistry::global().begin(id);
        let state = Arc::new(Mutex::new(AllState {
            observer: Some(observer),
            results: BTreeMap::new(),
            remaining: total,
            queue: tasks.into_iter().enumerate().collect(),
            in_flight: 0,
            window,
            draining: false,
        }));

        trace_event!("all {id} starting {total} tasks, window {window}");
        drain(&state, id);

        let cancel_state = Arc::clone(&state);
        CancelHandle::new(move || {
            {
                let mut state = cancel_state.lock();
                state.observer.take();
                state.queue.clear();
            }
            SubscriptionRegistry::global().cancel(id);
        })
    })
}

/// Starts queued tasks until the window is full, the queue is empty, or the
/// invocation has settled. Subscription happens outside the state lock.
///
/// Exactly one frame drains at a time: a task settling synchronously during
/// its own subscription re-enters here, sees the guard, and returns, and the
/// outermost frame picks up the freed window slot on its next iteration. The
/// stack stays flat no matter how many tasks settle during subscription.
fn drain<T, V, E>(state: &Arc<Mutex<AllState<T, V, E>>>, id: InvocationId)
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    {
        let mut s = state.lock();
        if s.draining {
            return;
        }
        s.draining = true;
    }
    loop {
        let (index, task) = {
            let mut s = state.lock();
            if s.observer.is_none() || s.in_flight >= s.window {
                s.draining = false;
                return;
            }
            let Some(next) = s.queue.pop_front() else {
                s.draining = false;
                return;
            };
            s.in_flight += 1;
            next
        };

        let value_state = Arc::clone(state);
        let error_state = Arc::clone(state);
        let finish_state = Arc::clone(state);

        let handle = task.subscribe(Observer::new(
            move |value| {
                let mut s = value_state.lock();
                // Values arriving after settlement are dropped, never recorded.
                if s.observer.is_some() {
                    s.results.insert(index, value);
                }
            },
            move |error| {
                let observer = {
                    let mut s = error_state.lock();
                    s.in_flight -= 1;
                    s.remaining -= 1;
                    s.queue.clear();
                    s.observer.take()
                };
                // First claimant wins; everyone else saw the slot empty out.
                if let Some(observer) = observer {
                    trace_event!("all {id} failing fast from task {index}");
                    observer.error(error);
                    SubscriptionRegistry::global().release(id);
                }
            },
            move || {
                let step = {
                    let mut s = finish_state.lock();
                    s.in_flight -= 1;
                    s.remaining -= 1;
                    if s.remaining == 0 {
                        match s.observer.take() {
                            Some(observer) => {
                                let values =
                                    std::mem::take(&mut s.results).into_values().collect();
                                Step::Emit(observer, values)
                            }
                            None => Step::Idle,
                        }
                    } else if s.observer.is_some() && !s.queue.is_empty() {
                        Step::Refill
                    } else {
                        Step::Idle
                    }
                };
                match step {
                    Step::Emit(observer, values) => {
                        trace_event!("all {id} emitting {} values", values.len());
                        observer.value(values);
                        observer.finished();
                        SubscriptionRegistry::global().release(id);
                    }
                    Step::Refill => {
                        drain(&finish_state, id);
                    }
                    Step::Idle => {}
                }
            },
        ));
        SubscriptionRegistry::global().insert(id, handle);
    }
}

/// Two-branch [`all`]: both values in argument order, or the first failure
/// tagged with its branch.
#[must_use]
pub fn all2<TA, TB, A, B, FA, FB>(a: TA, b: TB) -> AnyTask<(A, B), Either2<FA, FB>>
where
    TA: Task<A, FA> + Send + 'static,
    TB: Task<B, FB> + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    FA: Send + 'static,
    FB: Send + 'static,
{
    let a = adapt::map(a, |v| Some(Either2::A(v)), Either2::A);
    let b = adapt::map(b, |v| Some(Either2::B(v)), Either2::B);
    adapt::map(
        all(vec![a, b]),
        |values| {
            let mut slots = values.into_iter();
            match (slots.next(), slots.next()) {
                (Some(Either2::A(a)), Some(Either2::B(b))) => Some((a, b)),
                _ => None,
            }
        },
        |error| error,
    )
}

/// Three-branch [`all`].
#[must_use]
pub fn all3<TA, TB, TC, A, B, C, FA, FB, FC>(
    a: TA,
    b: TB,
    c: TC,
) -> AnyTask<(A, B, C), Either3<FA, FB, FC>>
where
    TA: Task<A, FA> + Send + 'static,
    TB: Task<B, FB> + Send + 'static,
    TC: Task<C, FC> + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    FA: Send + 'static,
    FB: Send + 'static,
    FC: Send + 'static,
{
    let a = adapt::map(a, |v| Some(Either3::A(v)), Either3::A);
    let b = adapt::map(b, |v| Some(Either3::B(v)), Either3::B);
    let c = adapt::map(c, |v| Some(Either3::C(v)), Either3::C);
    adapt::map(
        all(vec![a, b, c]),
        |values| {
            let mut slots = values.into_iter();
            match (slots.next(), slots.next(), slots.next()) {
                (Some(Either3::A(a)), Some(Either3::B(b)), Some(Either3::C(c))) => {
                    Some((a, b, c))
                }
                _ => None,
            }
        },
        |error| error,
    )
}

/// Four-branch [`all`].
#[must_use]
pub fn all4<TA, TB, TC, TD, A, B, C, D, FA, FB, FC, FD>(
    a: TA,
    b: TB,
    c: TC,
    d: TD,
) -> AnyTask<(A, B, C, D), Either4<FA, FB, FC, FD>>
where
    TA: Task<A, FA> + Send + 'static,
    TB: Task<B, FB> + Send + 'static,
    TC: Task<C, FC> + Send + 'static,
    TD: Task<D, FD> + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    FA: Send + 'static,
    FB: Send + 'static,
    FC: Send + 'static,
    FD: Send + 'static,
{
    let a = adapt::map(a, |v| Some(Either4::A(v)), Either4::A);
    let b = adapt::map(b, |v| Some(Either4::B(v)), Either4::B);
    let c = adapt::map(c, |v| Some(Either4::C(v)), Either4::C);
    let d = adapt::map(d, |v| Some(Either4::D(v)), Either4::D);
    adapt::map(
        all(vec![a, b, c, d]),
        |values| {
            let mut slots = values.into_iter();
            match (slots.next(), slots.next(), slots.next(), slots.next()) {
                (
                    Some(Either4::A(a)),
                    Some(Either4::B(b)),
                    Some(Either4::C(c)),
                    Some(Either4::D(d)),
                ) => Some((a, b, c, d)),
                _ => None,
            }
        },
        |error| error,
    )
}

//! `any`: wait for every task to settle, collecting outcomes.

use crate::either::{Either2, Either3, Either4};
use crate::outcome::Outcome;
use crate::registry::{InvocationId, SubscriptionRegistry};
use crate::task::{AnyTask, CancelHandle, Observer, Task};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::Arc;

use super::adapt;
use super::all::all;

struct AnyState<V, E> {
    observer: Option<Observer<Vec<Outcome<V, E>>, Infallible>>,
    /// Completion-ordered; no index is tracked. This asymmetry with `all`
    /// is deliberate and observable: callers see which tasks settled first.
    results: Vec<Outcome<V, E>>,
    remaining: usize,
}

/// Runs every task to its terminal state and emits one outcome per settled
/// task, in completion order. Never fails: task failures become data.
///
/// There is no early exit; every task must settle before the emission.
/// Zero tasks emit an empty vector immediately.
#[must_use]
pub fn any<T, V, E>(tasks: Vec<T>) -> AnyTask<Vec<Outcome<V, E>>, Infallible>
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

        let id = InvocationId::next();
        let registry = SubscriptionRegistry::global();
        registry.begin(id);
        let state = Arc::new(Mutex::new(AnyState {
            observer: Some(observer),
            results: Vec::with_capacity(total),
            remaining: total,
        }));

        trace_event!("any {id} starting {total} tasks");
        for task in tasks {
            let value_state = Arc::clone(&state);
            let error_state = Arc::clone(&state);
            let finish_state = Arc::clone(&state);
            let handle = task.subscribe(Observer::new(
                move |value| {
                    let mut s = value_state.lock();
                    if s.observer.is_some() {
                        s.results.push(Outcome::Success(value));
                    }
                },
                move |error| {
                    let emit = {
                        let mut s = error_state.lock();
                        s.results.push(Outcome::Failure(error));
                        s.remaining -= 1;
                        take_if_complete(&mut s)
                    };
                    finish_emit(emit, id);
                },
                move || {
                    let emit = {
                        let mut s = finish_state.lock();
                        s.remaining -= 1;
                        take_if_complete(&mut s)
                    };
                    finish_emit(emit, id);
                },
            ));
            registry.insert(id, handle);
        }

        let cancel_state = Arc::clone(&state);
        CancelHandle::new(move || {
            cancel_state.lock().observer.take();
            SubscriptionRegistry::global().cancel(id);
        })
    })
}

type Emission<V, E> = (Observer<Vec<Outcome<V, E>>, Infallible>, Vec<Outcome<V, E>>);

fn take_if_complete<V, E>(s: &mut AnyState<V, E>) -> Option<Emission<V, E>> {
    if s.remaining > 0 {
        return None;
    }
    let observer = s.observer.take()?;
    Some((observer, std::mem::take(&mut s.results)))
}

fn finish_emit<V, E>(emit: Option<Emission<V, E>>, id: InvocationId) {
    if let Some((observer, results)) = emit {
        trace_event!("any {id} emitting {} outcomes", results.len());
        observer.value(results);
        observer.finished();
        SubscriptionRegistry::global().release(id);
    }
}

/// Two-branch [`any`]: a dedicated outcome slot per branch; the tuple
/// preserves argument order regardless of completion order.
#[must_use]
pub fn any2<TA, TB, A, B, FA, FB>(
    a: TA,
    b: TB,
) -> AnyTask<(Outcome<A, FA>, Outcome<B, FB>), Infallible>
where
    TA: Task<A, FA> + Send + 'static,
    TB: Task<B, FB> + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    FA: Send + 'static,
    FB: Send + 'static,
{
    let a = adapt::capture(a, Either2::A);
    let b = adapt::capture(b, Either2::B);
    adapt::map(
        all(vec![a, b]),
        |slots| {
            let mut slots = slots.into_iter();
            match (slots.next(), slots.next()) {
                (Some(Either2::A(a)), Some(Either2::B(b))) => Some((a, b)),
                _ => None,
            }
        },
        |error| error,
    )
}

/// Three-branch [`any`].
#[must_use]
pub fn any3<TA, TB, TC, A, B, C, FA, FB, FC>(
    a: TA,
    b: TB,
    c: TC,
) -> AnyTask<(Outcome<A, FA>, Outcome<B, FB>, Outcome<C, FC>), Infallible>
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
    let a = adapt::capture(a, Either3::A);
    let b = adapt::capture(b, Either3::B);
    let c = adapt::capture(c, Either3::C);
    adapt::map(
        all(vec![a, b, c]),
        |slots| {
            let mut slots = slots.into_iter();
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

/// Four-branch [`any`].
#[must_use]
pub fn any4<TA, TB, TC, TD, A, B, C, D, FA, FB, FC, FD>(
    a: TA,
    b: TB,
    c: TC,
    d: TD,
) -> AnyTask<
    (
        Outcome<A, FA>,
        Outcome<B, FB>,
        Outcome<C, FC>,
        Outcome<D, FD>,
    ),
    Infallible,
>
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
    let a = adapt::capture(a, Either4::A);
    let b = adapt::capture(b, Either4::B);
    let c = adapt::capture(c, Either4::C);
    let d = adapt::capture(d, Either4::D);
    adapt::map(
        all(vec![a, b, c, d]),
        |slots| {
            let mut slots = slots.into_iter();
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

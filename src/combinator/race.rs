//! `race`: first task to settle wins.

use crate::registry::{InvocationId, SubscriptionRegistry};
use crate::task::{AnyTask, CancelHandle, Observer, Task};
use parking_lot::Mutex;
use std::sync::Arc;

/// Emits the value or error of whichever task settles first; later
/// settlements are observed but dropped at the guard.
///
/// All tasks are subscribed eagerly; losers are not cancelled and run to
/// completion with their results discarded. A task that finishes without
/// producing a value does not claim the race. A race over zero tasks never
/// settles.
#[must_use]
pub fn race<T, V, E>(tasks: Vec<T>) -> AnyTask<V, E>
where
    T: Task<V, E> + Send + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    AnyTask::new(move |observer| {
        if tasks.is_empty() {
            drop(observer);
            return CancelHandle::noop();
        }

        let id = InvocationId::next();
        let registry = SubscriptionRegistry::global();
        registry.begin(id);
        let slot = Arc::new(Mutex::new(Some(observer)));

        trace_event!("race {id} starting {} tasks", tasks.len());
        for (index, task) in tasks.into_iter().enumerate() {
            // A synchronously-settling task decides the race before the
            // rest are subscribed; skip them.
            if slot.lock().is_none() {
                break;
            }
            let value_slot = Arc::clone(&slot);
            let error_slot = Arc::clone(&slot);
            let handle = task.subscribe(Observer::new(
                move |value| {
                    let observer = value_slot.lock().take();
                    if let Some(observer) = observer {
                        trace_event!("race {id} won by task {index} with a value");
                        observer.value(value);
                        observer.finished();
                        SubscriptionRegistry::global().release(id);
                    }
                },
                move |error| {
                    let observer = error_slot.lock().take();
                    if let Some(observer) = observer {
                        trace_event!("race {id} won by task {index} with an error");
                        observer.error(error);
                        SubscriptionRegistry::global().release(id);
                    }
                },
                // A bare finished carries no settlement; it cannot win.
                || {},
            ));
            registry.insert(id, handle);
        }

        let cancel_slot = Arc::clone(&slot);
        CancelHandle::new(move || {
            cancel_slot.lock().take();
            SubscriptionRegistry::global().cancel(id);
        })
    })
}

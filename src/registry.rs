//! Subscription lifetime keeping for combinator invocations.
//!
//! Several combinators never hand the caller a reference to the per-branch
//! subscriptions they create; only the aggregate result is exposed. Without
//! an external keeper those handles would be dropped the moment the
//! combinator call returns, and — depending on the task implementation —
//! could tear down work whose callbacks have not fired yet. The
//! [`SubscriptionRegistry`] owns those handles for exactly the lifetime of
//! one invocation: created before fan-out, removed exactly once at the
//! terminal emission.
//!
//! The registry is a process-wide, lock-protected map, initialized at first
//! use with no explicit teardown; entries are removed individually on
//! completion. Removal releases the retain only — it never force-cancels
//! the underlying tasks ([`cancel`](SubscriptionRegistry::cancel) is the
//! explicit path for that).

use crate::task::CancelHandle;
use hashbrown::HashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for one combinator invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Allocates the next process-unique id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invocation-{}", self.0)
    }
}

/// One invocation's retained handles. Most invocations hold a handful.
type SubscriptionBox = SmallVec<[CancelHandle; 4]>;

/// Process-wide store of live cancellation handles, keyed by invocation id.
pub struct SubscriptionRegistry {
    boxes: Mutex<HashMap<InvocationId, SubscriptionBox>>,
}

impl SubscriptionRegistry {
    fn new() -> Self {
        Self {
            boxes: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the process-wide registry, initializing it on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<SubscriptionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Opens an empty box for `id`.
    ///
    /// Called before fan-out so that a task settling synchronously during
    /// subscription releases an entry that actually exists, instead of
    /// leaking handles inserted afterwards.
    pub fn begin(&self, id: InvocationId) {
        self.boxes.lock().entry(id).or_default();
        trace_event!("registry opened box for {id}");
    }

    /// Retains `handle` in the box for `id`.
    ///
    /// If the box was already released, the handle is dropped instead of
    /// resurrecting the entry.
    pub fn insert(&self, id: InvocationId, handle: CancelHandle) {
        let mut boxes = self.boxes.lock();
        if let Some(subscription_box) = boxes.get_mut(&id) {
            subscription_box.push(handle);
        } else {
            trace_event!("registry dropped handle for released {id}");
        }
    }

    /// Releases the box for `id`, dropping its handles without cancelling.
    ///
    /// Idempotent; a no-op if the box was already released.
    pub fn release(&self, id: InvocationId) {
        let removed = self.boxes.lock().remove(&id);
        if removed.is_some() {
            trace_event!("registry released {id}");
        }
    }

    /// Cancels every handle retained for `id`, then releases the box.
    ///
    /// Used when the caller discards interest in the combinator result.
    /// Idempotent; a no-op if the box was already released.
    pub fn cancel(&self, id: InvocationId) {
        let removed = self.boxes.lock().remove(&id);
        if let Some(handles) = removed {
            trace_event!("registry cancelling {} handles for {id}", handles.len());
            for handle in &handles {
                handle.cancel();
            }
        }
    }

    /// Returns `true` if a box is currently open for `id`.
    #[must_use]
    pub fn contains(&self, id: InvocationId) -> bool {
        self.boxes.lock().contains_key(&id)
    }

    /// Returns the number of open boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.lock().len()
    }

    /// Returns `true` if no boxes are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.lock().is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("boxes", &self.len())
            .finish()
    }
}

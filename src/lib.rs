//! Settle: promise-style combinators over one-shot asynchronous tasks.
//!
//! # Overview
//!
//! A *task* is a producer that eventually yields exactly one value or one
//! error, delivered through callbacks that may fire on any thread. Settle
//! composes such tasks with the classic promise combinators:
//!
//! - [`all`]: wait for every task, fail fast on the first error
//! - [`all_limit`]: `all` with a bound on simultaneous subscriptions
//! - [`any`]: wait for every task to settle, collecting outcomes, never failing
//! - [`race`]: first task to settle wins
//! - [`block_on`]: block the calling thread until a single task settles
//!
//! # Core Guarantees
//!
//! - **Exactly-once emission**: each combinator invocation produces exactly
//!   one terminal result, no matter how many task callbacks race to settle it.
//!   The settlement slot is claimed in a single critical section, never via
//!   check-then-act across lock boundaries.
//! - **Ordering**: `all` emits values in original task-index order regardless
//!   of completion order; the list form of `any` emits outcomes in completion
//!   order; the fixed-arity forms preserve argument order.
//! - **Subscription lifetime**: per-invocation cancellation handles are kept
//!   alive in a process-wide [`SubscriptionRegistry`] until the invocation
//!   emits, so callbacks can never fire into a deallocated subscription.
//!
//! # Module Structure
//!
//! - [`task`]: the [`Task`] trait, [`Observer`] callbacks, [`CancelHandle`],
//!   and the type-erased [`AnyTask`]
//! - [`outcome`]: the [`Outcome`] sum type
//! - [`either`]: branch-tagged unions for fixed-arity error typing
//! - [`source`]: trivial task constructors (`ready`, `fail`, `empty`, `never`)
//! - [`registry`]: the invocation-scoped subscription keeper
//! - [`combinator`]: `all` / `any` / `race`
//! - [`block`]: the synchronous bridge

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Structured logging shim. Forwards to `tracing` when the
/// `tracing-integration` feature is enabled; compiles to a no-op otherwise.
/// Defined ahead of the module declarations so it is textually in scope in
/// every module.
#[cfg(feature = "tracing-integration")]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing-integration"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        if false {
            let _ = format_args!($($arg)*);
        }
    };
}

pub mod block;
pub mod combinator;
pub mod either;
pub mod outcome;
pub mod registry;
pub mod source;
pub mod task;

pub use block::{AwaitError, WaitExt, block_on};
pub use combinator::{all, all2, all3, all4, all_limit, any, any2, any3, any4, race};
pub use either::{Either2, Either3, Either4};
pub use outcome::Outcome;
pub use registry::{InvocationId, SubscriptionRegistry};
pub use source::{empty, fail, never, ready};
pub use task::{AnyTask, CancelHandle, Observer, Task};

#[cfg(test)]
pub(crate) mod test_util;

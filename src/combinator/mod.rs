//! Combinators composing many one-shot tasks into one aggregate task.
//!
//! - [`all`] / [`all_limit`]: run every task, fail fast, collect values in
//!   input order
//! - [`all2`]..[`all4`]: heterogeneous `all` with per-branch error tagging
//! - [`any`]: run every task to its terminal state, collect outcomes,
//!   never fail
//! - [`any2`]..[`any4`]: heterogeneous `any` with per-branch outcome slots
//! - [`race`]: first task to settle wins
//!
//! All aggregation state lives behind one mutex per invocation; the
//! observer slot inside that mutex doubles as the settlement cell, so the
//! check for "already settled" and the claim are a single atomic step.

pub mod all;
pub mod any;
pub mod race;

mod adapt;

pub use all::{all, all2, all3, all4, all_limit};
pub use any::{any, any2, any3, any4};
pub use race::race;

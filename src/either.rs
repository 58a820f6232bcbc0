//! Branch-tagged unions for fixed-arity combinators.
//!
//! The fixed-arity forms of `all` accept branches with distinct error types
//! and must report *which* branch failed without erasing its error to a
//! common type. `Either2`/`Either3`/`Either4` carry that tag. The same
//! unions double internally as the homogeneous index-tagged value
//! representation behind the tuple adapters, so there is a single N-ary
//! aggregation core instead of near-identical per-arity rewrites.

use thiserror::Error;

/// One of two branches.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either2<A, B> {
    /// The first branch.
    #[error("branch a: {0}")]
    A(A),
    /// The second branch.
    #[error("branch b: {0}")]
    B(B),
}

/// One of three branches.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either3<A, B, C> {
    /// The first branch.
    #[error("branch a: {0}")]
    A(A),
    /// The second branch.
    #[error("branch b: {0}")]
    B(B),
    /// The third branch.
    #[error("branch c: {0}")]
    C(C),
}

/// One of four branches.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either4<A, B, C, D> {
    /// The first branch.
    #[error("branch a: {0}")]
    A(A),
    /// The second branch.
    #[error("branch b: {0}")]
    B(B),
    /// The third branch.
    #[error("branch c: {0}")]
    C(C),
    /// The fourth branch.
    #[error("branch d: {0}")]
    D(D),
}

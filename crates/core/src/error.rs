//! # Error Types
//!
//! Composition failures are first-class values. Type incompatibility between
//! two compositions never shows up here: it is a trait bound, so an ill-typed
//! chain does not compile. What remains are the failures a well-typed chain
//! can still hit at runtime.

use thiserror::Error;

/// Errors raised by memoizing compositions and the law checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositionError {
    /// The composition wraps no function.
    #[error("Empty composition: there is no function to invoke")]
    EmptyFunction,

    /// A composition law has a counterexample.
    #[error("Composition law `{law}` violated at input {input}")]
    LawViolation { law: &'static str, input: String },
}

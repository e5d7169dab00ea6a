//! Error types for task compositions.

use composable_core::CompositionError;
use thiserror::Error;

/// Errors returned when triggering or building a task composition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task already ran; each task composition runs at most once.
    #[error("Task already satisfied: a task composition runs at most once")]
    AlreadySatisfied,

    /// The inner result cannot feed the outer arguments (unchecked family).
    #[error("Cannot compose: {inner} does not feed {outer}")]
    SignatureMismatch {
        inner: &'static str,
        outer: &'static str,
    },

    /// A failure shared with the memoizing family, such as an empty function.
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Failures observed through a [`SharedFuture`](crate::SharedFuture).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FutureError {
    /// The wrapped function panicked while the task ran.
    #[error("Task panicked: {message}")]
    Panicked { message: String },

    /// The task was dropped without ever running.
    #[error("Task dropped before producing a value")]
    Abandoned,
}

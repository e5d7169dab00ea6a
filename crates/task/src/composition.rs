//! # Future-Backed Compositions
//!
//! A [`TaskComposition`] wraps a unary function in a single-shot task. The
//! task's [`SharedFuture`] exists from construction on, so observers can be
//! handed out before anything runs. `invoke` runs the function on the calling
//! thread and fulfils the future; a second `invoke` is rejected.
//!
//! ```rust
//! use composable_task::TaskComposition;
//!
//! let square = TaskComposition::new(|n: i32| n * n);
//! let observer = square.get_future();
//!
//! square.invoke(12).unwrap();
//! assert_eq!(observer.wait(), Ok(144));
//! assert!(square.invoke(3).is_err());
//! ```
//!
//! Compositions never memoize. Composing builds a new, untriggered task that
//! runs both functions inside it; the operands' own tasks are left alone.

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use composable_core::Callable;
use tracing::debug;

use crate::error::TaskError;
use crate::future::SharedFuture;
use crate::task::Task;

/// A shared, thread-safe unary function that lives for `'f`.
///
/// The lifetime lets arguments borrow from the caller, e.g. `&mut i32`.
/// A `composable_core::Func` is a `TaskFunc<'static, A, R>`.
pub type TaskFunc<'f, A, R> = Arc<dyn Fn(A) -> R + Send + Sync + 'f>;

/// A unary function run at most once, its result published through a
/// [`SharedFuture`].
pub struct TaskComposition<'f, A, R> {
    task: Task<'f, A, R>,
}

impl<'f, A, R: Clone> TaskComposition<'f, A, R> {
    /// Wrap a function in a fresh task.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'f,
    {
        Self::from_fn(Arc::new(func))
    }

    /// Wrap an already shared function.
    pub fn from_fn(func: TaskFunc<'f, A, R>) -> Self {
        Self::with_func(Some(func))
    }

    /// A composition with no function. Invoking it fails.
    pub fn empty() -> Self {
        Self::with_func(None)
    }

    pub(crate) fn with_func(func: Option<TaskFunc<'f, A, R>>) -> Self {
        Self {
            task: Task::new(func),
        }
    }

    /// Run the function with `arg` and publish the result.
    ///
    /// Returns the shared future, already ready. Fails with
    /// [`TaskError::AlreadySatisfied`] if the task ran before.
    pub fn invoke(&self, arg: A) -> Result<SharedFuture<R>, TaskError> {
        self.task.run(arg)
    }

    /// Run the function with `arg` now, publishing the result only when the
    /// calling thread exits.
    pub fn invoke_at_thread_exit(&self, arg: A) -> Result<SharedFuture<R>, TaskError>
    where
        R: 'static,
    {
        self.task.run_at_thread_exit(arg)
    }

    /// The shared future of this composition's task. Triggers nothing.
    pub fn get_future(&self) -> SharedFuture<R> {
        self.task.future()
    }
}

impl<'f, A, R> TaskComposition<'f, A, R> {
    /// Whether a function is present and the task has not run yet.
    pub fn valid(&self) -> bool {
        self.task.valid()
    }

    /// The underlying function, outside of any task.
    pub fn to_fn(&self) -> Option<TaskFunc<'f, A, R>> {
        self.task.func().cloned()
    }
}

impl<'f, A, R> TaskComposition<'f, A, R>
where
    A: 'f,
    R: Clone + 'f,
{
    /// Compose `self ∘ inner` into a new task mapping `b` to
    /// `self(inner(b).into())`.
    ///
    /// The result is empty if either operand is.
    pub fn compose<B, O>(&self, inner: &TaskComposition<'f, B, O>) -> TaskComposition<'f, B, R>
    where
        B: 'f,
        O: Into<A> + 'f,
    {
        debug!(
            outer = std::any::type_name::<Self>(),
            inner = std::any::type_name::<TaskComposition<'f, B, O>>(),
            "composing task functions"
        );
        TaskComposition::with_func(chain(self.to_fn(), inner.to_fn()))
    }

    /// Compose `self ∘ f` with a plain function as the inner stage.
    pub fn compose_fn<B, O, F>(&self, f: F) -> TaskComposition<'f, B, R>
    where
        B: 'f,
        O: Into<A> + 'f,
        F: Fn(B) -> O + Send + Sync + 'f,
    {
        let inner: TaskFunc<'f, B, O> = Arc::new(f);
        TaskComposition::with_func(chain(self.to_fn(), Some(inner)))
    }
}

/// `outer ∘ inner`, or nothing if either side is missing.
fn chain<'f, A, R, B, O>(
    outer: Option<TaskFunc<'f, A, R>>,
    inner: Option<TaskFunc<'f, B, O>>,
) -> Option<TaskFunc<'f, B, R>>
where
    A: 'f,
    R: 'f,
    B: 'f,
    O: Into<A> + 'f,
{
    let (outer, inner) = (outer?, inner?);
    let chained: TaskFunc<'f, B, R> = Arc::new(move |arg: B| outer(inner(arg).into()));
    Some(chained)
}

impl<'f, A, R: Clone> Clone for TaskComposition<'f, A, R> {
    /// Same function, fresh untriggered task.
    fn clone(&self) -> Self {
        Self::with_func(self.to_fn())
    }
}

impl<'f, A, R: Clone> Default for TaskComposition<'f, A, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'f, A, R> fmt::Debug for TaskComposition<'f, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskComposition")
            .field("valid", &self.valid())
            .finish()
    }
}

impl<'l, 'r, 'f, A, R, B, O> Mul<&'r TaskComposition<'f, B, O>> for &'l TaskComposition<'f, A, R>
where
    A: 'f,
    R: Clone + 'f,
    B: 'f,
    O: Into<A> + 'f,
{
    type Output = TaskComposition<'f, B, R>;

    fn mul(self, inner: &'r TaskComposition<'f, B, O>) -> TaskComposition<'f, B, R> {
        self.compose(inner)
    }
}

impl<'f, A, R: Clone> Callable for TaskComposition<'f, A, R> {
    type Input = A;
    type Output = Result<SharedFuture<R>, TaskError>;

    fn call(&self, input: A) -> Self::Output {
        self.invoke(input)
    }

    fn name(&self) -> &'static str {
        "TaskComposition"
    }
}

//! Semisafe compositions: task compositions that can be made uniform.
//!
//! A [`SemisafeComposition<A, R>`] behaves like a [`TaskComposition`], and in
//! addition can be turned into a same-typed `TaskComposition<R, R>` whenever
//! its result converts back into its argument. A uniform composition can be
//! chained with itself and with any other `R -> R` stage.
//!
//! ```rust
//! use composable_task::SemisafeComposition;
//!
//! let halve = SemisafeComposition::new(|n: i64| (n / 2) as i32);
//! let uniform = halve.uniform();
//!
//! let quarter = &uniform * &uniform;
//! assert_eq!(quarter.invoke(100).unwrap().wait(), Ok(25));
//! ```

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use composable_core::Callable;
use tracing::debug;

use crate::composition::{TaskComposition, TaskFunc};
use crate::error::TaskError;
use crate::future::SharedFuture;

/// A task composition that can be converted into a uniform `R -> R` one.
pub struct SemisafeComposition<'f, A, R> {
    inner: TaskComposition<'f, A, R>,
}

impl<'f, A, R: Clone> SemisafeComposition<'f, A, R> {
    /// Wrap a function in a fresh task.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'f,
    {
        Self::from_fn(Arc::new(func))
    }

    /// Wrap an already shared function.
    pub fn from_fn(func: TaskFunc<'f, A, R>) -> Self {
        Self {
            inner: TaskComposition::from_fn(func),
        }
    }

    /// A composition with no function.
    pub fn empty() -> Self {
        Self {
            inner: TaskComposition::empty(),
        }
    }

    /// See [`TaskComposition::invoke`].
    pub fn invoke(&self, arg: A) -> Result<SharedFuture<R>, TaskError> {
        self.inner.invoke(arg)
    }

    /// See [`TaskComposition::invoke_at_thread_exit`].
    pub fn invoke_at_thread_exit(&self, arg: A) -> Result<SharedFuture<R>, TaskError>
    where
        R: 'static,
    {
        self.inner.invoke_at_thread_exit(arg)
    }

    /// The shared future of the wrapped task. Triggers nothing.
    pub fn get_future(&self) -> SharedFuture<R> {
        self.inner.get_future()
    }
}

impl<'f, A, R> SemisafeComposition<'f, A, R> {
    /// Whether a function is present and the task has not run yet.
    pub fn valid(&self) -> bool {
        self.inner.valid()
    }

    /// The underlying function, outside of any task.
    pub fn to_fn(&self) -> Option<TaskFunc<'f, A, R>> {
        self.inner.to_fn()
    }
}

impl<'f, A, R> SemisafeComposition<'f, A, R>
where
    A: 'f,
    R: Clone + 'f,
{
    /// Compose `self ∘ inner`. Same rules as [`TaskComposition::compose`].
    pub fn compose<B, O>(
        &self,
        inner: &SemisafeComposition<'f, B, O>,
    ) -> SemisafeComposition<'f, B, R>
    where
        B: 'f,
        O: Into<A> + 'f,
    {
        SemisafeComposition {
            inner: self.inner.compose(&inner.inner),
        }
    }

    /// Compose `self ∘ f` with a plain function as the inner stage.
    pub fn compose_fn<B, O, F>(&self, f: F) -> SemisafeComposition<'f, B, R>
    where
        B: 'f,
        O: Into<A> + 'f,
        F: Fn(B) -> O + Send + Sync + 'f,
    {
        SemisafeComposition {
            inner: self.inner.compose_fn(f),
        }
    }

    /// Convert into a uniform `R -> R` task composition.
    ///
    /// The new composition maps `r` to `self(r.into())` and has its own
    /// untriggered task. Only available when `R` converts into `A`.
    pub fn uniform(&self) -> TaskComposition<'f, R, R>
    where
        R: Into<A>,
    {
        debug!(
            from = std::any::type_name::<Self>(),
            "converting to uniform task composition"
        );
        let func = self.to_fn().map(|func| -> TaskFunc<'f, R, R> {
            Arc::new(move |r: R| func(r.into()))
        });
        TaskComposition::with_func(func)
    }
}

impl<'f, R: Clone> From<TaskComposition<'f, R, R>> for SemisafeComposition<'f, R, R> {
    fn from(inner: TaskComposition<'f, R, R>) -> Self {
        Self { inner }
    }
}

impl<'f, A, R: Clone> Clone for SemisafeComposition<'f, A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'f, A, R: Clone> Default for SemisafeComposition<'f, A, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'f, A, R> fmt::Debug for SemisafeComposition<'f, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemisafeComposition")
            .field("valid", &self.valid())
            .finish()
    }
}

impl<'l, 'r, 'f, A, R, B, O> Mul<&'r SemisafeComposition<'f, B, O>>
    for &'l SemisafeComposition<'f, A, R>
where
    A: 'f,
    R: Clone + 'f,
    B: 'f,
    O: Into<A> + 'f,
{
    type Output = SemisafeComposition<'f, B, R>;

    fn mul(self, inner: &'r SemisafeComposition<'f, B, O>) -> SemisafeComposition<'f, B, R> {
        self.compose(inner)
    }
}

impl<'f, A, R: Clone> Callable for SemisafeComposition<'f, A, R> {
    type Input = A;
    type Output = Result<SharedFuture<R>, TaskError>;

    fn call(&self, input: A) -> Self::Output {
        self.invoke(input)
    }

    fn name(&self) -> &'static str {
        "SemisafeComposition"
    }
}

//! Unchecked compositions: task compositions of any arity.
//!
//! An [`UncheckedComposition<Args, R>`] takes its arguments as a tuple, so a
//! single type covers nullary, unary and n-ary functions. Composition has no
//! `Into` bound; instead the shapes are compared by [`TypeId`] when the
//! composition is built. The inner result feeds the outer function if it is
//! exactly the outer argument tuple, or if it is the single element of a
//! one-element argument tuple. Anything else is a
//! [`TaskError::SignatureMismatch`].
//!
//! ```rust
//! use composable_task::UncheckedComposition;
//!
//! let add = UncheckedComposition::new(|(a, b): (i32, i32)| a + b);
//! let square = UncheckedComposition::new(|(n,): (i32,)| n * n);
//!
//! // i32 feeds (i32,)
//! let square_of_sum = square.compose(&add).unwrap();
//! assert_eq!(square_of_sum.invoke((2, 3)).unwrap().wait(), Ok(25));
//!
//! let shout = UncheckedComposition::new(|(s,): (String,)| s.to_uppercase());
//! assert!(shout.compose(&add).is_err());
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use composable_core::Callable;
use tracing::{debug, warn};

use crate::composition::{TaskComposition, TaskFunc};
use crate::error::TaskError;
use crate::future::SharedFuture;

/// A task composition over a tuple of arguments.
///
/// Shapes are compared by [`TypeId`], so functions and arguments are
/// `'static`.
pub struct UncheckedComposition<Args, R> {
    inner: TaskComposition<'static, Args, R>,
}

/// How an inner result becomes the outer argument tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    /// The result is the argument tuple.
    Direct,
    /// The result is the only element of the argument tuple.
    Wrap,
}

impl Feed {
    fn check<O: 'static, Args: 'static>() -> Result<Self, TaskError> {
        let args = TypeId::of::<Args>();
        if TypeId::of::<O>() == args {
            Ok(Feed::Direct)
        } else if TypeId::of::<(O,)>() == args {
            Ok(Feed::Wrap)
        } else {
            let err = TaskError::SignatureMismatch {
                inner: type_name::<O>(),
                outer: type_name::<Args>(),
            };
            warn!(%err, "rejected unchecked composition");
            Err(err)
        }
    }

    fn apply<O: 'static, Args: 'static>(self, value: O) -> Args {
        let boxed: Box<dyn Any> = match self {
            Feed::Direct => Box::new(value),
            Feed::Wrap => Box::new((value,)),
        };
        match boxed.downcast::<Args>() {
            Ok(args) => *args,
            Err(_) => unreachable!("argument shape is checked when composing"),
        }
    }
}

impl<Args, R: Clone> UncheckedComposition<Args, R> {
    /// Wrap a function taking its arguments as a tuple.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Args) -> R + Send + Sync + 'static,
    {
        Self::from_fn(Arc::new(func))
    }

    /// Wrap an already shared function.
    pub fn from_fn(func: TaskFunc<'static, Args, R>) -> Self {
        Self {
            inner: TaskComposition::from_fn(func),
        }
    }

    /// A composition with no function. Invoking it fails.
    pub fn empty() -> Self {
        Self {
            inner: TaskComposition::empty(),
        }
    }

    /// Run the function with `args` and publish the result.
    pub fn invoke(&self, args: Args) -> Result<SharedFuture<R>, TaskError> {
        self.inner.invoke(args)
    }

    /// Run the function now, publishing the result when this thread exits.
    pub fn invoke_at_thread_exit(&self, args: Args) -> Result<SharedFuture<R>, TaskError>
    where
        R: 'static,
    {
        self.inner.invoke_at_thread_exit(args)
    }

    /// The shared future of the wrapped task. Triggers nothing.
    pub fn get_future(&self) -> SharedFuture<R> {
        self.inner.get_future()
    }
}

impl<Args, R> UncheckedComposition<Args, R> {
    /// Whether a function is present and the task has not run yet.
    pub fn valid(&self) -> bool {
        self.inner.valid()
    }

    /// The underlying function, outside of any task.
    pub fn to_fn(&self) -> Option<TaskFunc<'static, Args, R>> {
        self.inner.to_fn()
    }
}

impl<Args, R> UncheckedComposition<Args, R>
where
    Args: 'static,
    R: Clone + 'static,
{
    /// Compose `self ∘ inner`, checking that the inner result fits the outer
    /// arguments.
    ///
    /// The result is empty if either operand is, but the shapes are checked
    /// regardless.
    pub fn compose<B, O>(
        &self,
        inner: &UncheckedComposition<B, O>,
    ) -> Result<UncheckedComposition<B, R>, TaskError>
    where
        B: 'static,
        O: 'static,
    {
        self.chain(inner.to_fn())
    }

    /// Compose `self ∘ f` with a plain function as the inner stage.
    pub fn compose_fn<B, O, F>(&self, f: F) -> Result<UncheckedComposition<B, R>, TaskError>
    where
        B: 'static,
        O: 'static,
        F: Fn(B) -> O + Send + Sync + 'static,
    {
        let inner: TaskFunc<'static, B, O> = Arc::new(f);
        self.chain(Some(inner))
    }

    fn chain<B, O>(
        &self,
        inner: Option<TaskFunc<'static, B, O>>,
    ) -> Result<UncheckedComposition<B, R>, TaskError>
    where
        B: 'static,
        O: 'static,
    {
        let feed = Feed::check::<O, Args>()?;
        debug!(?feed, "composing unchecked task functions");
        let func = self.to_fn().zip(inner).map(|(outer, inner)| -> TaskFunc<'static, B, R> {
            Arc::new(move |args: B| outer(feed.apply(inner(args))))
        });
        Ok(UncheckedComposition {
            inner: TaskComposition::with_func(func),
        })
    }
}

impl<Args, R: Clone> Clone for UncheckedComposition<Args, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Args, R: Clone> Default for UncheckedComposition<Args, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args, R> fmt::Debug for UncheckedComposition<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncheckedComposition")
            .field("args", &type_name::<Args>())
            .field("valid", &self.valid())
            .finish()
    }
}

impl<Args, R: Clone> Callable for UncheckedComposition<Args, R> {
    type Input = Args;
    type Output = Result<SharedFuture<R>, TaskError>;

    fn call(&self, input: Args) -> Self::Output {
        self.invoke(input)
    }

    fn name(&self) -> &'static str {
        "UncheckedComposition"
    }
}

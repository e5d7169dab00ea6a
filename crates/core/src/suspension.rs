//! # Suspensions
//!
//! Lazy values built on the nullary composition [`Suspended`]. A suspended
//! value is evaluated by the first [`force`] and served from the memo on
//! every later one.
//!
//! ```rust
//! use composable_core::suspension::{delay, force, suspend};
//! use composable_core::Composition;
//!
//! let doubled = Composition::new(|n: i32| n * 2).compose(&delay(21));
//! assert_eq!(force(&doubled), 42);
//!
//! let greeting = suspend::<String, _>("hello");
//! assert_eq!(force(&greeting), "hello");
//! ```

use crate::memo::{Composition, Suspended};

/// Suspend an already computed value.
///
/// The suspension owns the value; forcing it hands out clones.
pub fn delay<T>(value: T) -> Suspended<T>
where
    T: Clone + Send + Sync + 'static,
{
    Composition::new(move |()| value.clone())
}

/// Force a suspension: evaluate it on the first call, reuse the result after.
pub fn force<T: Clone>(suspended: &Suspended<T>) -> T {
    suspended.force()
}

/// Suspend the construction of a `T` from `args`.
///
/// `T::from(args)` runs on the first force only.
pub fn suspend<T, Args>(args: Args) -> Suspended<T>
where
    T: From<Args> + Clone + Send + 'static,
    Args: Clone + Send + Sync + 'static,
{
    Composition::new(move |()| T::from(args.clone()))
}

/// Suspend an arbitrary constructor.
pub fn suspend_with<T, F>(constructor: F) -> Suspended<T>
where
    T: Clone + Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Composition::new(move |()| constructor())
}

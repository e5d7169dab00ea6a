//! # Composable Core - Memoizing Compositions
//!
//! This crate provides the synchronous half of the composable primitives:
//!
//! - **Compositions**: memoizing wrappers around unary functions that chain
//!   with type-checked `compose` / `*`
//! - **Suspensions**: single-evaluation lazy values (`delay`, `force`, `suspend`)
//! - **Laws**: identity, associativity and round-trip checks on sample inputs
//! - **Tracing**: zero-cost, compile-time configurable per-call traces
//! - **Errors**: the failures a well-typed chain can still hit
//!
//! ## Design Philosophy
//!
//! A pipeline is a value. `&h * &(&g * &f)` builds a new composition without
//! running anything; evaluation happens on `invoke`, and every stage keeps
//! the results it has already produced.
//!
//! The future-backed family lives in `composable-task`.

pub mod error;
pub mod laws;
pub mod memo;
pub mod suspension;
pub mod trace;

// Re-export key types at crate root for convenience
pub use error::CompositionError;
pub use laws::identity;
pub use memo::{Composition, Func, Suspended};
pub use suspension::{delay, force, suspend, suspend_with};
pub use trace::{AutoTraced, Callable, CallableExt, TraceNode, Traced};

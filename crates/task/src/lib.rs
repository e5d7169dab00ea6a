//! # Composable Task - Future-Backed Compositions
//!
//! The single-shot half of the composable primitives:
//!
//! - **Shared futures**: clonable handles to an eventual outcome, readable by
//!   blocking `wait`, by polling, or by `.await`
//! - **Task compositions**: functions run at most once, their result
//!   published through a shared future handed out before anything runs
//! - **Semisafe compositions**: task compositions that can be made uniform
//!   (`R -> R`) when the result converts back into the argument
//! - **Unchecked compositions**: any arity through argument tuples, with the
//!   composition shapes checked when a chain is built
//!
//! Tasks run on the thread that triggers them; there is no pool. A task can
//! also run immediately and publish only when its thread exits, for work
//! whose thread-local state must be torn down first.
//!
//! ```rust
//! use composable_task::TaskComposition;
//!
//! let parse = TaskComposition::new(|s: &'static str| s.parse::<i32>().unwrap_or(0));
//! let double = TaskComposition::new(|n: i32| n * 2);
//!
//! let pipeline = &double * &parse;
//! let result = pipeline.get_future();
//! pipeline.invoke("21").unwrap();
//! assert_eq!(result.wait(), Ok(42));
//! ```

pub mod composition;
pub mod error;
mod exit;
pub mod future;
pub mod semisafe;
mod task;
pub mod unchecked;

pub use composition::{TaskComposition, TaskFunc};
pub use error::{FutureError, TaskError};
pub use future::{Outcome, SharedFuture};
pub use semisafe::SemisafeComposition;
pub use unchecked::UncheckedComposition;

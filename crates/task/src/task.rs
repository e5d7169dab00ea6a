//! The single-shot task shared by every task composition.
//!
//! A [`Task`] pairs a function with a promise and the [`SharedFuture`] that
//! observes it. Triggering claims the promise, runs the function on the
//! calling thread and fulfils the future. A second trigger finds the promise
//! gone and fails with [`TaskError::AlreadySatisfied`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use composable_core::CompositionError;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::composition::TaskFunc;
use crate::error::{FutureError, TaskError};
use crate::exit::at_thread_exit;
use crate::future::{self, Outcome, Promise, SharedFuture};

pub(crate) struct Task<'f, A, R> {
    func: Option<TaskFunc<'f, A, R>>,
    promise: Mutex<Option<Promise<R>>>,
    future: SharedFuture<R>,
}

impl<'f, A, R> Task<'f, A, R> {
    pub(crate) fn func(&self) -> Option<&TaskFunc<'f, A, R>> {
        self.func.as_ref()
    }

    /// Function present and promise not yet claimed.
    pub(crate) fn valid(&self) -> bool {
        self.func.is_some() && self.promise.lock().is_some()
    }

    fn claim(&self) -> Result<(&TaskFunc<'f, A, R>, Promise<R>), TaskError> {
        let func = self.func.as_ref().ok_or(CompositionError::EmptyFunction)?;
        match self.promise.lock().take() {
            Some(promise) => Ok((func, promise)),
            None => {
                warn!("task triggered twice");
                Err(TaskError::AlreadySatisfied)
            }
        }
    }
}

impl<'f, A, R: Clone> Task<'f, A, R> {
    pub(crate) fn new(func: Option<TaskFunc<'f, A, R>>) -> Self {
        let (promise, future) = future::promise();
        Self {
            func,
            promise: Mutex::new(Some(promise)),
            future,
        }
    }

    pub(crate) fn future(&self) -> SharedFuture<R> {
        self.future.clone()
    }

    /// Run the function now and make the outcome visible now.
    pub(crate) fn run(&self, arg: A) -> Result<SharedFuture<R>, TaskError> {
        let (func, promise) = self.claim()?;
        debug!("running task");
        promise.fulfil(evaluate(func, arg));
        Ok(self.future())
    }

    /// Run the function now, but make the outcome visible when this thread exits.
    pub(crate) fn run_at_thread_exit(&self, arg: A) -> Result<SharedFuture<R>, TaskError>
    where
        R: 'static,
    {
        let (func, promise) = self.claim()?;
        debug!("running task, readiness deferred to thread exit");
        let outcome = evaluate(func, arg);
        at_thread_exit(publish(promise, outcome));
        Ok(self.future())
    }
}

fn publish<R: 'static>(promise: Promise<R>, outcome: Outcome<R>) -> impl FnOnce() + 'static {
    move || promise.fulfil(outcome)
}

/// Run `func`, turning a panic into a [`FutureError::Panicked`].
fn evaluate<A, R>(func: &TaskFunc<'_, A, R>, arg: A) -> Outcome<R> {
    panic::catch_unwind(AssertUnwindSafe(|| func(arg))).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(%message, "task panicked, failure stored in its future");
        FutureError::Panicked { message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn task<F>(f: F) -> Task<'static, i32, i32>
    where
        F: Fn(i32) -> i32 + Send + Sync + 'static,
    {
        Task::new(Some(Arc::new(f)))
    }

    #[test]
    fn test_run_fulfils_future() {
        let t = task(|n| n * 3);
        assert!(t.valid());
        assert!(!t.future().is_ready());

        let future = t.run(4).unwrap();
        assert_eq!(future.wait(), Ok(12));
        assert!(!t.valid());
    }

    #[test]
    fn test_second_run_is_rejected() {
        let t = task(|n| n);
        t.run(1).unwrap();
        assert_eq!(t.run(2).unwrap_err(), TaskError::AlreadySatisfied);
        assert_eq!(t.future().wait(), Ok(1));
    }

    #[test]
    fn test_empty_task_is_not_spent() {
        let t: Task<'static, i32, i32> = Task::new(None);
        assert!(!t.valid());
        assert_eq!(
            t.run(1).unwrap_err(),
            TaskError::Composition(CompositionError::EmptyFunction)
        );
        assert!(!t.future().is_ready());
    }

    #[test]
    fn test_panic_is_captured() {
        let t = task(|n| if n < 0 { panic!("negative input") } else { n });
        let future = t.run(-1).unwrap();
        assert_eq!(
            future.wait(),
            Err(FutureError::Panicked {
                message: "negative input".to_string()
            })
        );
    }

    #[test]
    fn test_formatted_panic_message() {
        let t = task(|n| panic!("bad input {}", n));
        let future = t.run(9).unwrap();
        assert_eq!(
            future.wait(),
            Err(FutureError::Panicked {
                message: "bad input 9".to_string()
            })
        );
    }

    #[test]
    fn test_dropped_task_abandons_future() {
        let future = {
            let t = task(|n| n);
            t.future()
        };
        assert_eq!(future.wait(), Err(FutureError::Abandoned));
    }

    #[test]
    fn test_thread_exit_readiness() {
        let t = Arc::new(task(|n| n + 100));

        let worker = Arc::clone(&t);
        let seen_inside = std::thread::spawn(move || {
            let future = worker.run_at_thread_exit(1).unwrap();
            future.is_ready()
        })
        .join()
        .unwrap();

        assert!(!seen_inside);
        assert_eq!(t.future().wait(), Ok(101));
    }
}

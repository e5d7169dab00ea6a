//! Work deferred until the current thread exits.
//!
//! Each thread owns a queue in thread-local storage. When the thread exits,
//! the queue is destroyed and runs every job pushed onto it, in order.
//!
//! The main thread is not guaranteed to run thread-local destructors when
//! the process exits, so jobs deferred there may never run.

use std::cell::RefCell;

use tracing::warn;

thread_local! {
    static AT_EXIT: ExitQueue = ExitQueue::default();
}

#[derive(Default)]
struct ExitQueue {
    jobs: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Drop for ExitQueue {
    fn drop(&mut self) {
        for job in std::mem::take(self.jobs.get_mut()) {
            job();
        }
    }
}

/// Run `job` when the calling thread exits.
///
/// If the thread is already tearing down its thread-local storage, `job`
/// runs immediately.
pub(crate) fn at_thread_exit(job: impl FnOnce() + 'static) {
    let mut job: Option<Box<dyn FnOnce()>> = Some(Box::new(job));
    let queued = AT_EXIT.try_with(|queue| {
        if let Some(job) = job.take() {
            queue.jobs.borrow_mut().push(job);
        }
    });

    if let Some(job) = job {
        warn!(error = ?queued.err(), "thread-local storage unavailable, running exit job now");
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_jobs_run_when_thread_exits() {
        let ran = Arc::new(AtomicUsize::new(0));

        let worker_ran = Arc::clone(&ran);
        std::thread::spawn(move || {
            for _ in 0..3 {
                let ran = Arc::clone(&worker_ran);
                at_thread_exit(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                });
            }
            assert_eq!(worker_ran.load(Ordering::SeqCst), 0);
        })
        .join()
        .unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_jobs_run_in_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let worker_order = Arc::clone(&order);
        std::thread::spawn(move || {
            for i in 0..4 {
                let order = Arc::clone(&worker_order);
                at_thread_exit(move || order.lock().push(i));
            }
        })
        .join()
        .unwrap();

        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }
}

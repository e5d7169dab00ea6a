//! # Shared Futures
//!
//! A [`SharedFuture`] is the read side of a single-shot task: any number of
//! observers may hold a clone, wait on it (blocking or `.await`), and all of
//! them see the same outcome. The write side, [`Promise`], is consumed by
//! the first and only fulfilment.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use futures::ready;
use tracing::trace;

use crate::error::FutureError;

/// What observers of a task eventually see.
pub type Outcome<R> = Result<R, FutureError>;

type Received<R> = Result<Outcome<R>, oneshot::Canceled>;

/// A clonable handle to the eventual outcome of a task.
///
/// Polling after completion returns the outcome again, so a handle can be
/// awaited by `&mut` any number of times.
pub struct SharedFuture<R> {
    // Never polled itself; `polling` is a copy of it.
    inner: Shared<oneshot::Receiver<Outcome<R>>>,
    polling: Option<Shared<oneshot::Receiver<Outcome<R>>>>,
}

/// The write side of a [`SharedFuture`].
pub(crate) struct Promise<R> {
    sender: oneshot::Sender<Outcome<R>>,
}

/// Create a connected promise / future pair.
pub(crate) fn promise<R: Clone>() -> (Promise<R>, SharedFuture<R>) {
    let (sender, receiver) = oneshot::channel();
    (
        Promise { sender },
        SharedFuture {
            inner: receiver.shared(),
            polling: None,
        },
    )
}

impl<R> Promise<R> {
    /// Make the outcome visible to every observer.
    pub(crate) fn fulfil(self, outcome: Outcome<R>) {
        if self.sender.send(outcome).is_err() {
            trace!("task fulfilled with no observers left");
        }
    }
}

impl<R: Clone> SharedFuture<R> {
    /// Block the current thread until the outcome is available.
    ///
    /// Waiting on the thread that is supposed to trigger the task, before
    /// triggering it, never returns.
    pub fn wait(&self) -> Outcome<R> {
        futures::executor::block_on(self.clone())
    }

    /// Whether the outcome is available without waiting.
    pub fn is_ready(&self) -> bool {
        self.try_get().is_some()
    }

    /// The outcome, if it is already available.
    pub fn try_get(&self) -> Option<Outcome<R>> {
        self.inner.clone().now_or_never().map(flatten)
    }

    /// Whether both handles observe the same task.
    pub fn same_task(&self, other: &SharedFuture<R>) -> bool {
        Shared::ptr_eq(&self.inner, &other.inner)
    }
}

fn flatten<R>(received: Received<R>) -> Outcome<R> {
    received.unwrap_or(Err(FutureError::Abandoned))
}

impl<R: Clone> Future for SharedFuture<R> {
    type Output = Outcome<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self { inner, polling } = self.get_mut();
        let received = ready!(polling.get_or_insert_with(|| inner.clone()).poll_unpin(cx));
        *polling = None;
        Poll::Ready(flatten(received))
    }
}

impl<R> Clone for SharedFuture<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            polling: None,
        }
    }
}

impl<R> fmt::Debug for SharedFuture<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedFuture").finish_non_exhaustive()
    }
}

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{PaccError, Result};

/// A pending invocation paired with the sending half of its result channel.
///
/// Running the task consumes it, so it executes at most once. Dropping it
/// unrun closes the channel and the matching [`TaskHandle`] resolves to
/// [`PaccError::TaskAbandoned`].
pub struct Task<T> {
    f: Box<dyn FnOnce() -> T + Send + 'static>,
    tx: Sender<Result<T>>,
}

/// The receiving half of a task's result channel.
pub struct TaskHandle<T> {
    rx: Receiver<Result<T>>,
}

impl<T: Send + 'static> Task<T> {
    pub fn new<F>(f: F) -> (Task<T>, TaskHandle<T>)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        (Task { f: Box::new(f), tx }, TaskHandle { rx })
    }

    /// Executes the invocation, capturing a panic as the task's result.
    pub fn run(self) {
        let Task { f, tx } = self;
        let result = panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| PaccError::TaskPanicked(panic_message(payload)));
        // the handle may already be gone; nobody is left to observe the value
        let _ = tx.send(result);
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has produced a value or failed.
    pub fn join(self) -> Result<T> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(PaccError::TaskAbandoned),
        }
    }

    pub fn join_timeout(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PaccError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(PaccError::TaskAbandoned),
        }
    }

    /// Returns the result if it is already available.
    pub fn try_join(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PaccError::TaskAbandoned)),
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}

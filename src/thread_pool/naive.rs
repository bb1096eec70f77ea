use std::thread;

use log::error;

use crate::thread_pool::ThreadPool;
use crate::{PaccError, Result};

/// Starts a fresh OS thread for every job. Parallelism is unbounded.
pub struct NaiveThreadPool;

impl ThreadPool for NaiveThreadPool {
    fn new(_threads: u32) -> Result<Self> {
        Ok(NaiveThreadPool)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // a job that never starts drops its task, which the handle reports as abandoned
        if let Err(e) = thread::Builder::new().spawn(job) {
            error!("could not spawn ad-hoc thread: {}", PaccError::Spawn(e));
        }
    }
}

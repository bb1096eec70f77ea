use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::task::panic_message;
use crate::thread_pool::{Job, ThreadPool};
use crate::{PaccError, Result};

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    work_available: Condvar,
    stopping: AtomicBool,
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // jobs run outside the lock, so a poisoned guard still holds a consistent queue
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A fixed set of worker threads draining one FIFO queue.
///
/// Shutdown is non-draining: once [`shutdown`](SharedQueueThreadPool::shutdown)
/// starts, workers finish the job in hand and exit, and jobs still queued are
/// dropped unrun. A [`TaskHandle`](crate::TaskHandle) for such a job resolves
/// to [`PaccError::TaskAbandoned`], as does one for a job submitted after
/// shutdown. Dropping the pool shuts it down.
pub struct SharedQueueThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(max_workers: u32) -> Result<Self> {
        if max_workers == 0 {
            return Err(PaccError::InvalidThreadCount);
        }
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
            stopping: AtomicBool::new(false),
        });
        let mut pool = SharedQueueThreadPool {
            shared,
            workers: Vec::with_capacity(max_workers as usize),
        };
        for id in 0..max_workers {
            let shared = Arc::clone(&pool.shared);
            let worker = thread::Builder::new()
                .name(format!("pacc-worker-{}", id))
                .spawn(move || run_worker(id, &shared));
            match worker {
                Ok(handle) => pool.workers.push(handle),
                // dropping `pool` stops the workers started so far
                Err(e) => return Err(PaccError::Spawn(e)),
            }
        }
        debug!("started shared queue pool with {} workers", max_workers);
        Ok(pool)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.lock_queue();
        if self.shared.stopping.load(Ordering::Acquire) {
            drop(queue);
            // no worker is left to run it; dropping the job abandons its task
            debug!("pool is stopped, dropping submitted job");
            return;
        }
        queue.push_back(Box::new(job));
        drop(queue);
        self.shared.work_available.notify_one();
    }
}

impl SharedQueueThreadPool {
    /// Stops every worker and waits for them to exit. Queued jobs are not run.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        // taking the lock orders the store before any worker's re-check and wait
        {
            let _queue = self.shared.lock_queue();
            self.shared.stopping.store(true, Ordering::Release);
        }
        self.shared.work_available.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread exited by panic");
            }
        }
        let abandoned = {
            let mut queue = self.shared.lock_queue();
            let n = queue.len();
            queue.clear();
            n
        };
        debug!("shared queue pool stopped, {} queued jobs abandoned", abandoned);
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::Acquire)
    }

    /// Number of jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.lock_queue().len()
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(id: u32, shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.lock_queue();
            while !shared.stopping.load(Ordering::Acquire) && queue.is_empty() {
                queue = shared
                    .work_available
                    .wait(queue)
                    .unwrap_or_else(|e| e.into_inner());
            }
            if shared.stopping.load(Ordering::Acquire) {
                debug!("worker {} exiting", id);
                return;
            }
            match queue.pop_front() {
                Some(job) => job,
                None => continue,
            }
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!("worker {}: job panicked: {}", id, panic_message(payload));
        }
    }
}

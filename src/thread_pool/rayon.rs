use log::error;

use crate::task::panic_message;
use crate::thread_pool::ThreadPool;
use crate::{PaccError, Result};

/// A [`ThreadPool`] on top of a dedicated `rayon` pool.
///
/// Unlike [`SharedQueueThreadPool`](crate::SharedQueueThreadPool), dropping
/// this pool drains it: rayon still runs every job already queued, so no
/// [`TaskHandle`](crate::TaskHandle) from it resolves to
/// [`PaccError::TaskAbandoned`].
pub struct RayonThreadPool {
    pool: rayon::ThreadPool,
}

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self> {
        if threads == 0 {
            return Err(PaccError::InvalidThreadCount);
        }
        Ok(RayonThreadPool {
            pool: rayon::ThreadPoolBuilder::new()
                .num_threads(threads as usize)
                .thread_name(|i| format!("pacc-rayon-{}", i))
                .panic_handler(|payload| error!("job panicked: {}", panic_message(payload)))
                .build()?,
        })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }
}

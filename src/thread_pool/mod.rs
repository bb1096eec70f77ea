use crate::task::{Task, TaskHandle};
use crate::Result;

pub trait ThreadPool {
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// Queues a fire-and-forget job.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;

    /// Queues `f` and returns a handle to its eventual result.
    ///
    /// Never blocks the caller. A panic inside `f` is delivered through the
    /// handle and does not take the worker down.
    fn submit<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = Task::new(f);
        self.spawn(move || task.run());
        handle
    }
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

mod naive;
mod rayon;
mod shared;

pub use self::naive::NaiveThreadPool;
pub use self::rayon::RayonThreadPool;
pub use self::shared::SharedQueueThreadPool;

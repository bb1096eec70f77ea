//! Fork-join accumulate.
//!
//! The input is carved from the front into chunks of `fork_threshold`
//! elements while more than `fork_threshold` elements remain. Each chunk is
//! folded on its own, seeded with the monoid identity, and the remainder is
//! folded on the calling thread. Partial results are then joined strictly
//! in carving order:
//!
//! ```text
//! op(... op(op(start, chunk_0), chunk_1) ..., tail)
//! ```
//!
//! so `start` is applied exactly once and the result equals the sequential
//! left fold for any associative operation, commutative or not.
//!
//! A panic inside the operation surfaces as [`PaccError::TaskPanicked`]
//! whether it hits a forked chunk or the part folded on the calling thread.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use log::debug;

use crate::config::{ReduceConfig, Strategy};
use crate::monoid::Monoid;
use crate::task::{panic_message, TaskHandle};
use crate::thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};
use crate::{PaccError, Result};

/// Plain left fold, the reference every parallel variant must agree with.
pub fn sequential<I, T>(iter: I, start: T, monoid: &Monoid<T>) -> T
where
    I: IntoIterator<Item = T>,
{
    monoid.fold(iter, start)
}

/// Fork-join accumulate with one ad-hoc thread per chunk.
pub fn paccumulate<I, T>(iter: I, start: T, monoid: &Monoid<T>, fork_threshold: usize) -> Result<T>
where
    I: IntoIterator<Item = T>,
    T: Clone + Send + 'static,
{
    paccumulate_pooled(iter, start, monoid, fork_threshold, &NaiveThreadPool)
}

/// Fork-join accumulate with every chunk submitted to `pool`.
///
/// Blocks until all chunks are folded. Calling this from inside a job of a
/// bounded `pool` can deadlock once every worker waits on queued chunks.
pub fn paccumulate_pooled<I, T, P>(
    iter: I,
    start: T,
    monoid: &Monoid<T>,
    fork_threshold: usize,
    pool: &P,
) -> Result<T>
where
    I: IntoIterator<Item = T>,
    T: Clone + Send + 'static,
    P: ThreadPool,
{
    if fork_threshold == 0 {
        return Err(PaccError::InvalidThreshold);
    }
    let mut iter = iter.into_iter().peekable();
    let mut partials: Vec<TaskHandle<T>> = Vec::new();
    let mut tail: Vec<T> = iter.by_ref().take(fork_threshold).collect();
    while iter.peek().is_some() {
        let next = iter.by_ref().take(fork_threshold).collect();
        let chunk = mem::replace(&mut tail, next);
        let monoid = monoid.clone();
        partials.push(pool.submit(move || monoid.concat(chunk)));
    }
    if partials.is_empty() {
        return catch_op(|| monoid.fold(tail, start));
    }
    debug!(
        "forked {} chunks of {}, {} elements left to the caller",
        partials.len(),
        fork_threshold,
        tail.len()
    );

    catch_op(|| {
        let local = monoid.concat(tail);
        let mut acc = start;
        for partial in partials {
            acc = monoid.combine(acc, partial.join()?);
        }
        Ok(monoid.combine(acc, local))
    })?
}

/// Upper bound on scoped threads alive at once in [`paccumulate_scoped`].
pub const MAX_LIVE_FORKS: usize = 64;

/// Fork-join over a borrowed slice on scoped threads.
///
/// The first `fork_threshold` elements are split off to a thread, then the
/// next, and so on, at most [`MAX_LIVE_FORKS`] threads per wave. Each wave is
/// joined in order before the next one starts. The remainder is folded on
/// the calling thread.
pub fn paccumulate_scoped<T>(
    items: &[T],
    start: T,
    monoid: &Monoid<T>,
    fork_threshold: usize,
) -> Result<T>
where
    T: Clone + Send + Sync,
{
    if fork_threshold == 0 {
        return Err(PaccError::InvalidThreshold);
    }
    if items.len() <= fork_threshold {
        return catch_op(|| monoid.fold(items.iter().cloned(), start));
    }
    let mut acc = start;
    let mut rest = items;
    while rest.len() > fork_threshold {
        let mut wave = Vec::with_capacity(MAX_LIVE_FORKS);
        while rest.len() > fork_threshold && wave.len() < MAX_LIVE_FORKS {
            let (head, tail) = rest.split_at(fork_threshold);
            wave.push(head);
            rest = tail;
        }
        for partial in fold_wave(&wave, monoid)? {
            acc = catch_op(|| monoid.combine(acc, partial))?;
        }
    }
    catch_op(|| monoid.combine(acc, monoid.concat(rest.iter().cloned())))
}

fn fold_wave<T>(chunks: &[&[T]], monoid: &Monoid<T>) -> Result<Vec<T>>
where
    T: Clone + Send + Sync,
{
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(chunks.len());
        let mut spawn_error = None;
        for &chunk in chunks {
            let spawned = thread::Builder::new()
                .spawn_scoped(s, move || monoid.concat(chunk.iter().cloned()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        // every started thread is joined here so none is left panicked inside the scope
        let partials: Vec<Result<T>> = handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|payload| PaccError::TaskPanicked(panic_message(payload)))
            })
            .collect();
        if let Some(e) = spawn_error {
            return Err(PaccError::Spawn(e));
        }
        partials.into_iter().collect()
    })
}

/// Runs an operation on the calling thread, reporting a panic the same way
/// a forked chunk would.
fn catch_op<R>(f: impl FnOnce() -> R) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| PaccError::TaskPanicked(panic_message(payload)))
}

/// Where a [`Reducer`] runs its chunk folds.
///
/// Teardown differs between the pooled variants: dropping `Shared` abandons
/// queued chunks, dropping `Rayon` runs them first.
pub enum Executor {
    Sequential,
    AdHoc,
    Shared(SharedQueueThreadPool),
    Rayon(RayonThreadPool),
}

impl Executor {
    pub fn new(strategy: Strategy, threads: u32) -> Result<Self> {
        Ok(match strategy {
            Strategy::Sequential => Executor::Sequential,
            Strategy::AdHoc => Executor::AdHoc,
            Strategy::Shared => Executor::Shared(SharedQueueThreadPool::new(threads)?),
            Strategy::Rayon => Executor::Rayon(RayonThreadPool::new(threads)?),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Executor::Sequential => Strategy::Sequential,
            Executor::AdHoc => Strategy::AdHoc,
            Executor::Shared(_) => Strategy::Shared,
            Executor::Rayon(_) => Strategy::Rayon,
        }
    }
}

/// A monoid, a fork threshold and an executor chosen at runtime.
pub struct Reducer<T> {
    monoid: Monoid<T>,
    fork_threshold: usize,
    executor: Executor,
}

impl<T> Reducer<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(monoid: Monoid<T>, fork_threshold: usize, executor: Executor) -> Result<Self> {
        if fork_threshold == 0 {
            return Err(PaccError::InvalidThreshold);
        }
        Ok(Reducer {
            monoid,
            fork_threshold,
            executor,
        })
    }

    pub fn from_config(config: &ReduceConfig, monoid: Monoid<T>) -> Result<Self> {
        debug!("building reducer from {:?}", config);
        let executor = Executor::new(config.strategy, config.threads)?;
        Reducer::new(monoid, config.fork_threshold, executor)
    }

    pub fn reduce<I>(&self, iter: I, start: T) -> Result<T>
    where
        I: IntoIterator<Item = T>,
    {
        let (monoid, threshold) = (&self.monoid, self.fork_threshold);
        match &self.executor {
            Executor::Sequential => catch_op(|| sequential(iter, start, monoid)),
            Executor::AdHoc => paccumulate(iter, start, monoid, threshold),
            Executor::Shared(pool) => paccumulate_pooled(iter, start, monoid, threshold, pool),
            Executor::Rayon(pool) => paccumulate_pooled(iter, start, monoid, threshold, pool),
        }
    }

    pub fn monoid(&self) -> &Monoid<T> {
        &self.monoid
    }

    pub fn strategy(&self) -> Strategy {
        self.executor.strategy()
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_utils::sync::WaitGroup;

use paccumulate::thread_pool::*;
use paccumulate::{PaccError, Result};

fn spawn_counter<P: ThreadPool>(pool: P) -> Result<()> {
    const TASK_NUM: usize = 20;
    const ADD_COUNT: usize = 1000;

    let wg = WaitGroup::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..TASK_NUM {
        let counter = Arc::clone(&counter);
        let wg = wg.clone();
        pool.spawn(move || {
            for _ in 0..ADD_COUNT {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            drop(wg);
        })
    }

    wg.wait();
    assert_eq!(counter.load(Ordering::SeqCst), TASK_NUM * ADD_COUNT);
    Ok(())
}

fn spawn_nested_task<P: ThreadPool>(pool: P) -> Result<()> {
    const TASK_NUM: usize = 10;
    const ADD_COUNT: usize = 1000;

    let wg = WaitGroup::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..TASK_NUM {
        let counter = Arc::clone(&counter);
        let wg = wg.clone();
        pool.spawn(move || {
            let inner = thread::spawn(move || {
                for _ in 0..ADD_COUNT {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                drop(wg);
            });
            inner.join().unwrap();
        })
    }

    wg.wait();
    assert_eq!(counter.load(Ordering::SeqCst), TASK_NUM * ADD_COUNT);
    Ok(())
}

fn submit_sum<P: ThreadPool>(pool: &P, n: u64) -> Result<u64> {
    let handles: Vec<_> = (0..n).map(|i| pool.submit(move || i)).collect();
    handles.into_iter().map(|h| h.join()).sum()
}

#[test]
fn naive_thread_pool_spawn_counter() -> Result<()> {
    let pool = NaiveThreadPool::new(4)?;
    spawn_counter(pool)
}

#[test]
fn shared_queue_thread_pool_spawn_counter() -> Result<()> {
    let pool = SharedQueueThreadPool::new(4)?;
    spawn_counter(pool)
}

#[test]
fn rayon_thread_pool_spawn_counter() -> Result<()> {
    let pool = RayonThreadPool::new(4)?;
    spawn_counter(pool)
}

#[test]
fn shared_queue_thread_pool_spawn_nested_task() -> Result<()> {
    let pool = SharedQueueThreadPool::new(4)?;
    spawn_nested_task(pool)
}

#[test]
fn rayon_thread_pool_spawn_nested_task() -> Result<()> {
    let pool = RayonThreadPool::new(4)?;
    spawn_nested_task(pool)
}

#[test]
fn shared_queue_thread_pool_panic_task() -> Result<()> {
    const TASK_NUM: usize = 20;

    let pool = SharedQueueThreadPool::new(4)?;
    for _ in 0..TASK_NUM {
        pool.spawn(move || {
            // It suppresses flood of panic messages to the console.
            panic_control::disable_hook_in_current_thread();
            panic!();
        })
    }

    spawn_counter(pool)
}

#[test]
fn submitted_results_sum_regardless_of_pool_size() -> Result<()> {
    const N: u64 = 200;
    for threads in [1, 2, 3, 8] {
        let pool = SharedQueueThreadPool::new(threads)?;
        assert_eq!(submit_sum(&pool, N)?, N * (N - 1) / 2);
        let pool = RayonThreadPool::new(threads)?;
        assert_eq!(submit_sum(&pool, N)?, N * (N - 1) / 2);
    }
    assert_eq!(submit_sum(&NaiveThreadPool, N)?, N * (N - 1) / 2);
    Ok(())
}

#[test]
fn failed_task_does_not_affect_siblings() -> Result<()> {
    let pool = SharedQueueThreadPool::new(3)?;
    let handles: Vec<_> = (0..30u32)
        .map(|i| {
            pool.submit(move || {
                if i == 17 {
                    panic_control::disable_hook_in_current_thread();
                    panic!("task {} failed", i);
                }
                i * 2
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(v) => assert_eq!(v, i as u32 * 2),
            Err(PaccError::TaskPanicked(msg)) => {
                assert_eq!(i, 17);
                assert_eq!(msg, "task 17 failed");
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    // the worker that ran the failing task is still serving
    assert_eq!(pool.submit(|| 1).join()?, 1);
    Ok(())
}

#[test]
fn four_workers_run_eight_sleepers_in_two_waves() -> Result<()> {
    let pool = SharedQueueThreadPool::new(4)?;
    let start = Instant::now();
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            pool.submit(move || {
                thread::sleep(Duration::from_millis(100));
                i
            })
        })
        .collect();
    let sum = handles
        .into_iter()
        .map(|h| h.join())
        .sum::<Result<u64>>()?;
    let elapsed = start.elapsed();

    assert_eq!(sum, 28);
    assert!(elapsed >= Duration::from_millis(200), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(700), "{:?}", elapsed);
    Ok(())
}

#[test]
fn concurrent_submitters() -> Result<()> {
    let pool = Arc::new(SharedQueueThreadPool::new(4)?);
    let submitters: Vec<_> = (0..4u64)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                (0..100u64)
                    .map(|i| pool.submit(move || t * 100 + i))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut total = 0;
    for submitter in submitters {
        for handle in submitter.join().unwrap() {
            total += handle.join()?;
        }
    }
    assert_eq!(total, 400 * 399 / 2);
    Ok(())
}

#[test]
fn dropping_pool_abandons_queued_tasks() -> Result<()> {
    let pool = SharedQueueThreadPool::new(1)?;
    let busy = pool.submit(|| thread::sleep(Duration::from_millis(100)));
    let queued: Vec<_> = (0..5).map(|i| pool.submit(move || i)).collect();
    // let the single worker pick up the sleeper before tearing down
    thread::sleep(Duration::from_millis(20));
    drop(pool);

    busy.join()?;
    for handle in queued {
        assert!(matches!(
            handle.join_timeout(Duration::from_millis(200)),
            Err(PaccError::TaskAbandoned)
        ));
    }
    Ok(())
}

#[test]
fn dropping_rayon_pool_still_runs_queued_tasks() -> Result<()> {
    let pool = RayonThreadPool::new(1)?;
    let busy = pool.submit(|| thread::sleep(Duration::from_millis(50)));
    let queued: Vec<_> = (0..5u32).map(|i| pool.submit(move || i)).collect();
    drop(pool);

    busy.join()?;
    let sum = queued
        .into_iter()
        .map(|h| h.join_timeout(Duration::from_secs(5)))
        .sum::<Result<u32>>()?;
    assert_eq!(sum, 10);
    Ok(())
}

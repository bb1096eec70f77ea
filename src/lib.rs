//! Fork-join parallel accumulate.
//!
//! This crate folds a sequence with an associative operation by splitting
//! it into fixed-size chunks, folding the chunks concurrently and joining
//! the partial results in order. Chunks run either on ad-hoc threads or on
//! a [`ThreadPool`], most notably the fixed-size [`SharedQueueThreadPool`].
//!
//! ```rust
//! # use paccumulate::{paccumulate, Monoid};
//! let sum = paccumulate(1..=1_000_000u64, 0, &Monoid::sum(), 1000).unwrap();
//! assert_eq!(sum, 500_000_500_000);
//! ```

pub mod config;
mod error;
pub mod monoid;
pub mod reduce;
pub mod task;
pub mod thread_pool;

pub use config::{ReduceConfig, Strategy};
pub use error::{PaccError, Result};
pub use monoid::Monoid;
pub use reduce::{
    paccumulate, paccumulate_pooled, paccumulate_scoped, sequential, Executor, Reducer,
};
pub use task::{Task, TaskHandle};
pub use thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};

use std::env;
use std::fmt;
use std::str::FromStr;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::{PaccError, Result};

pub const THREADS_VAR: &str = "PACC_THREADS";
pub const FORK_THRESHOLD_VAR: &str = "PACC_FORK_THRESHOLD";
pub const STRATEGY_VAR: &str = "PACC_STRATEGY";

/// How chunk folds are scheduled.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// No forking at all.
    Sequential,
    /// A fresh thread per chunk.
    AdHoc,
    /// Chunks queue on a [`SharedQueueThreadPool`](crate::SharedQueueThreadPool).
    Shared,
    /// Chunks queue on a [`RayonThreadPool`](crate::RayonThreadPool).
    Rayon,
}

impl FromStr for Strategy {
    type Err = PaccError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "adhoc" => Ok(Strategy::AdHoc),
            "shared" => Ok(Strategy::Shared),
            "rayon" => Ok(Strategy::Rayon),
            other => Err(PaccError::Config(format!("unknown strategy `{}`", other))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Sequential => "sequential",
            Strategy::AdHoc => "adhoc",
            Strategy::Shared => "shared",
            Strategy::Rayon => "rayon",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReduceConfig {
    pub threads: u32,
    pub fork_threshold: usize,
    pub strategy: Strategy,
}

fn hardware_concurrency() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

impl Default for ReduceConfig {
    fn default() -> Self {
        let n = hardware_concurrency();
        ReduceConfig {
            threads: n as u32,
            fork_threshold: n,
            strategy: Strategy::Shared,
        }
    }
}

impl ReduceConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let config: ReduceConfig = serde_json::from_str(s)?;
        config.validate()
    }

    /// Reads `PACC_THREADS`, `PACC_FORK_THRESHOLD` and `PACC_STRATEGY`,
    /// keeping the default for any that is unset.
    pub fn from_env() -> Result<Self> {
        let mut config = ReduceConfig::default();
        if let Some(threads) = env_var(THREADS_VAR)? {
            config.threads = threads;
        }
        if let Some(threshold) = env_var(FORK_THRESHOLD_VAR)? {
            config.fork_threshold = threshold;
        }
        if let Some(strategy) = env_var(STRATEGY_VAR)? {
            config.strategy = strategy;
        }
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.threads == 0 {
            return Err(PaccError::InvalidThreadCount);
        }
        if self.fork_threshold == 0 {
            return Err(PaccError::InvalidThreshold);
        }
        Ok(self)
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PaccError::Config(format!("{}={}: {}", name, raw, e))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(PaccError::Config(format!("{}: {}", name, e))),
    }
}

use std::fmt::{self, Display};
use std::io;

#[derive(Debug)]
pub enum PaccError {
    /// A pool was asked for zero worker threads.
    InvalidThreadCount,
    /// A reduction was asked to fork every zero elements.
    InvalidThreshold,
    /// The OS refused to start a worker thread.
    Spawn(io::Error),
    PoolBuild(rayon::ThreadPoolBuildError),
    /// The task panicked; carries the panic payload when it was a string.
    TaskPanicked(String),
    /// The task was dropped from the queue before any worker ran it.
    TaskAbandoned,
    Timeout,
    Config(String),
    Serde(serde_json::Error),
}

impl From<io::Error> for PaccError {
    fn from(value: io::Error) -> Self {
        PaccError::Spawn(value)
    }
}

impl From<rayon::ThreadPoolBuildError> for PaccError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        PaccError::PoolBuild(value)
    }
}

impl From<serde_json::Error> for PaccError {
    fn from(value: serde_json::Error) -> Self {
        PaccError::Serde(value)
    }
}

impl Display for PaccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaccError::InvalidThreadCount => f.write_str("thread count must be positive"),
            PaccError::InvalidThreshold => f.write_str("fork threshold must be positive"),
            PaccError::Spawn(e) => write!(f, "could not spawn worker thread: {}", e),
            PaccError::PoolBuild(e) => write!(f, "could not build rayon pool: {}", e),
            PaccError::TaskPanicked(msg) => write!(f, "task panicked: {}", msg),
            PaccError::TaskAbandoned => f.write_str("task was abandoned by a stopping pool"),
            PaccError::Timeout => f.write_str("timed out waiting for task result"),
            PaccError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            PaccError::Serde(e) => write!(f, "config deserialization failed: {}", e),
        }
    }
}

impl std::error::Error for PaccError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaccError::Spawn(e) => Some(e),
            PaccError::PoolBuild(e) => Some(e),
            PaccError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PaccError>;

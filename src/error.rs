//! Error types for the scheduling harness
//!
//! Run-level failures (`HarnessError`) abort a run before or after the spawn
//! pass. Per-thread failures (`SpawnError`, `JoinError`) are recorded against
//! a thread index and never unwind the run.

use nix::errno::Errno;
use serde::Serialize;
use thiserror::Error;

/// Fatal errors for a whole run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Barrier party mismatch: armed for {parties} workers but {arrived} already arrived")]
    BarrierMismatch { parties: usize, arrived: usize },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Why a single worker thread could not be created
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The OS refused the policy/priority/affinity combination
    #[error("scheduling unavailable during {stage}: {errno}")]
    SchedulingUnavailable { stage: &'static str, errno: Errno },

    /// Creation failed for a non-scheduling reason (thread limits, memory)
    #[error("resource exhaustion during {stage}: {errno}")]
    ResourceExhaustion { stage: &'static str, errno: Errno },
}

impl SpawnError {
    /// Classify a raw pthread return code
    pub fn from_code(stage: &'static str, code: i32) -> Self {
        let errno = Errno::from_raw(code);
        match errno {
            Errno::EPERM | Errno::EINVAL | Errno::EOPNOTSUPP => {
                SpawnError::SchedulingUnavailable { stage, errno }
            }
            _ => SpawnError::ResourceExhaustion { stage, errno },
        }
    }

    pub fn errno(&self) -> Errno {
        match self {
            SpawnError::SchedulingUnavailable { errno, .. }
            | SpawnError::ResourceExhaustion { errno, .. } => *errno,
        }
    }

    /// Raw error code as returned by pthread
    pub fn code(&self) -> i32 {
        self.errno() as i32
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpawnError::SchedulingUnavailable { .. } => ErrorKind::SchedulingUnavailable,
            SpawnError::ResourceExhaustion { .. } => ErrorKind::ResourceExhaustion,
        }
    }
}

/// Why a spawned worker could not be joined cleanly
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    #[error("worker panicked")]
    Panicked,

    #[error("pthread_join failed: {0}")]
    Os(Errno),
}

/// Serializable failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SchedulingUnavailable,
    ResourceExhaustion,
    WorkerPanicked,
    JoinFailed,
}

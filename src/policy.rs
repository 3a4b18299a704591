//! Scheduling policies understood by the harness

use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

/// Scheduling class requested for a worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchedPolicy {
    /// `SCHED_FIFO`: fixed priority, no time slicing
    #[serde(rename = "FIFO")]
    RealtimeFifo,
    /// `SCHED_OTHER`: the default time-shared class
    #[serde(rename = "OTHER")]
    TimeShared,
}

impl SchedPolicy {
    /// Map a policy token to a policy
    ///
    /// Only the exact token `FIFO` selects the real-time class; every other
    /// token (`NORMAL`, `OTHER`, ...) falls back to time-shared.
    pub fn from_token(token: &str) -> Self {
        if token == "FIFO" {
            SchedPolicy::RealtimeFifo
        } else {
            SchedPolicy::TimeShared
        }
    }

    /// The `SCHED_*` constant for this policy
    pub fn as_raw(self) -> libc::c_int {
        match self {
            SchedPolicy::RealtimeFifo => libc::SCHED_FIFO,
            SchedPolicy::TimeShared => libc::SCHED_OTHER,
        }
    }

    /// Priority actually handed to the OS for a requested priority
    ///
    /// Time-shared threads always run at static priority 0.
    pub fn effective_priority(self, requested: i32) -> i32 {
        match self {
            SchedPolicy::RealtimeFifo => requested,
            SchedPolicy::TimeShared => 0,
        }
    }

    /// Static priority range the kernel accepts for this policy
    pub fn priority_range(self) -> Option<RangeInclusive<i32>> {
        let raw = self.as_raw();
        // SAFETY: both calls only read the policy argument
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(raw),
                libc::sched_get_priority_max(raw),
            )
        };
        if min < 0 || max < 0 {
            None
        } else {
            Some(min..=max)
        }
    }

    pub fn is_realtime(self) -> bool {
        matches!(self, SchedPolicy::RealtimeFifo)
    }
}

impl fmt::Display for SchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedPolicy::RealtimeFifo => write!(f, "FIFO"),
            SchedPolicy::TimeShared => write!(f, "OTHER"),
        }
    }
}

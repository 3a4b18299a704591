//! Run plans: per-thread policy/priority pairs plus the shared wait
//!
//! Policies and priorities arrive as two independent comma-separated lists.
//! Pairing stops as soon as either list runs out or the requested thread
//! count is reached, so a short list yields fewer threads, never defaults.

use crate::error::{HarnessError, Result};
use crate::policy::SchedPolicy;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Policy and priority for one thread index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThreadRequest {
    pub policy: SchedPolicy,
    pub priority: i32,
}

impl ThreadRequest {
    pub fn new(policy: SchedPolicy, priority: i32) -> Self {
        Self { policy, priority }
    }

    /// Pair a policy token with a priority token
    pub fn from_tokens(policy: &str, priority: &str) -> Result<Self> {
        let priority = priority.trim().parse::<i32>().map_err(|e| {
            HarnessError::Configuration(format!("invalid priority '{}': {}", priority, e))
        })?;
        Ok(Self::new(SchedPolicy::from_token(policy.trim()), priority))
    }
}

/// Validated input for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlan {
    threads_requested: usize,
    wait: Duration,
    requests: Vec<ThreadRequest>,
}

impl RunPlan {
    /// Validate a thread count, a wait duration in seconds and the requests
    ///
    /// Requests beyond `threads` are dropped.
    pub fn new(threads: i64, wait_seconds: f64, requests: Vec<ThreadRequest>) -> Result<Self> {
        if threads < 1 {
            return Err(HarnessError::Configuration(format!(
                "thread count must be at least 1, got {}",
                threads
            )));
        }
        let wait = Duration::try_from_secs_f64(wait_seconds).map_err(|_| {
            HarnessError::Configuration(format!(
                "wait time must be a finite, non-negative number of seconds, got {}",
                wait_seconds
            ))
        })?;

        let threads_requested = usize::try_from(threads).map_err(|_| {
            HarnessError::Configuration(format!("thread count {} is too large", threads))
        })?;
        let mut requests = requests;
        requests.truncate(threads_requested);
        if requests.is_empty() {
            return Err(HarnessError::Configuration(
                "no complete policy/priority pair was supplied".to_string(),
            ));
        }

        Ok(Self {
            threads_requested,
            wait,
            requests,
        })
    }

    /// Build a plan from comma-separated policy and priority lists
    pub fn from_lists(threads: i64, wait_seconds: f64, policies: &str, priorities: &str) -> Result<Self> {
        let requests = pair_tokens(policies, priorities, threads.max(0) as usize)?;
        let plan = Self::new(threads, wait_seconds, requests)?;
        if plan.truncated() > 0 {
            warn!(
                requested = plan.threads_requested,
                paired = plan.requests.len(),
                "fewer policy/priority pairs than threads, running only the paired ones"
            );
        }
        Ok(plan)
    }

    pub fn threads_requested(&self) -> usize {
        self.threads_requested
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn requests(&self) -> &[ThreadRequest] {
        &self.requests
    }

    /// Requested thread slots that have no policy/priority pair
    pub fn truncated(&self) -> usize {
        self.threads_requested - self.requests.len()
    }
}

/// Split both lists on commas and pair them up to `limit` entries
///
/// Empty tokens are skipped, so `"FIFO,,FIFO"` holds two policies.
pub fn pair_tokens(policies: &str, priorities: &str, limit: usize) -> Result<Vec<ThreadRequest>> {
    let policies = policies.split(',').filter(|t| !t.is_empty());
    let priorities = priorities.split(',').filter(|t| !t.is_empty());
    policies
        .zip(priorities)
        .take(limit)
        .map(|(policy, priority)| ThreadRequest::from_tokens(policy, priority))
        .collect()
}

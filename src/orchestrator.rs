//! Orchestrator: spawn every worker, open the barrier, join them all
//!
//! Per-thread creation failures are recorded and reported but never stop the
//! run (unless strict mode asks for that). The barrier is armed only after
//! the spawn pass, with the number of threads that actually exist.

use crate::affinity::CpuAffinity;
use crate::barrier::StartBarrier;
use crate::clock::{RunClock, TimeSource};
use crate::error::{ErrorKind, JoinError, Result, SpawnError};
use crate::plan::RunPlan;
use crate::policy::SchedPolicy;
use crate::rt_thread::{self, RtJoinHandle};
use crate::worker::{self, Progress, ThreadSpec, WorkerReport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrator settings that do not vary per thread
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// CPUs every worker is pinned to
    pub affinity: CpuAffinity,
    /// Stop creating threads after the first creation failure
    pub strict: bool,
    /// Destination of the per-iteration and failure lines
    pub progress: Progress,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            affinity: CpuAffinity::default(),
            strict: false,
            progress: Progress::Stdout,
        }
    }
}

/// A thread index that did not produce a worker report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadFailure {
    pub id: usize,
    pub policy: SchedPolicy,
    pub priority: i32,
    pub kind: ErrorKind,
    /// Raw errno, when the OS reported one
    pub code: Option<i32>,
    pub message: String,
}

impl ThreadFailure {
    fn spawn(id: usize, policy: SchedPolicy, priority: i32, err: &SpawnError) -> Self {
        Self {
            id,
            policy,
            priority,
            kind: err.kind(),
            code: Some(err.code()),
            message: err.to_string(),
        }
    }

    fn join(id: usize, policy: SchedPolicy, priority: i32, err: &JoinError) -> Self {
        let (kind, code) = match err {
            JoinError::Panicked => (ErrorKind::WorkerPanicked, None),
            JoinError::Os(errno) => (ErrorKind::JoinFailed, Some(*errno as i32)),
        };
        Self {
            id,
            policy,
            priority,
            kind,
            code,
            message: err.to_string(),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub threads_requested: usize,
    pub threads_planned: usize,
    #[serde(serialize_with = "secs")]
    pub wait: Duration,
    pub affinity: CpuAffinity,
    /// Reports of every joined worker, by id
    pub started: Vec<WorkerReport>,
    /// Indices that failed to start or to join, by id
    pub failures: Vec<ThreadFailure>,
    /// Set when strict mode stopped the spawn pass early
    pub aborted_early: bool,
    #[serde(serialize_with = "secs")]
    pub elapsed: Duration,
}

fn secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl RunResult {
    pub fn started_ids(&self) -> Vec<usize> {
        self.started.iter().map(|r| r.id).collect()
    }

    pub fn failed_ids(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.id).collect()
    }

    pub fn report(&self, id: usize) -> Option<&WorkerReport> {
        self.started.iter().find(|r| r.id == id)
    }

    pub fn failure(&self, id: usize) -> Option<&ThreadFailure> {
        self.failures.iter().find(|f| f.id == id)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.aborted_early
    }

    /// Spread between the earliest and latest first-iteration start
    pub fn start_spread(&self) -> Option<Duration> {
        let starts: Vec<Duration> = self.started.iter().filter_map(|r| r.first_start()).collect();
        let min = starts.iter().min()?;
        let max = starts.iter().max()?;
        Some(*max - *min)
    }
}

/// Owns the barrier, the thread specs and the live handles of a run
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: HarnessConfig,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Spawn, release and join every worker in `plan`
    ///
    /// Only a barrier mismatch is fatal; everything else ends up in the
    /// returned `RunResult`.
    pub fn run(&self, plan: &RunPlan) -> Result<RunResult> {
        let clock = RunClock::start();
        let barrier = Arc::new(StartBarrier::new(clock));
        let progress = self.config.progress;

        let specs: Vec<ThreadSpec> = plan
            .requests()
            .iter()
            .enumerate()
            .map(|(id, request)| {
                ThreadSpec::new(
                    id,
                    *request,
                    self.config.affinity.clone(),
                    plan.wait(),
                    Arc::clone(&barrier),
                )
            })
            .collect();

        info!(
            requested = plan.threads_requested(),
            planned = specs.len(),
            wait_s = plan.wait().as_secs_f64(),
            affinity = %self.config.affinity,
            "starting run"
        );

        let mut handles: Vec<(usize, SchedPolicy, i32, RtJoinHandle<WorkerReport>)> =
            Vec::with_capacity(specs.len());
        let mut failures = Vec::new();
        let mut aborted_early = false;

        for spec in specs {
            let (id, policy, priority) = (spec.id, spec.policy, spec.priority);
            let attrs = spec.attributes();
            match rt_thread::spawn_with(attrs, move || worker::run(spec, clock, progress)) {
                Ok(handle) => {
                    debug!(id, %policy, priority, "worker created");
                    handles.push((id, policy, priority, handle));
                }
                Err(err) => {
                    warn!(
                        id,
                        %policy,
                        priority,
                        range = ?policy.priority_range(),
                        error = %err,
                        "worker creation failed"
                    );
                    progress.line(format_args!("Thread {} create error: {}", id, err.code()));
                    failures.push(ThreadFailure::spawn(id, policy, priority, &err));
                    if self.config.strict {
                        aborted_early = true;
                        break;
                    }
                }
            }
        }

        let armed = barrier.arm(handles.len());
        if armed.is_err() {
            barrier.abort();
        }

        let mut started = Vec::with_capacity(handles.len());
        for (id, policy, priority, handle) in handles {
            match handle.join() {
                Ok(report) => started.push(report),
                Err(err) => {
                    warn!(id, error = %err, "worker join failed");
                    failures.push(ThreadFailure::join(id, policy, priority, &err));
                }
            }
        }
        armed?;

        started.sort_by_key(|r| r.id);
        failures.sort_by_key(|f| f.id);

        let elapsed = clock.elapsed();
        info!(
            started = started.len(),
            failed = failures.len(),
            elapsed_s = elapsed.as_secs_f64(),
            "run finished"
        );

        Ok(RunResult {
            threads_requested: plan.threads_requested(),
            threads_planned: plan.requests().len(),
            wait: plan.wait(),
            affinity: self.config.affinity.clone(),
            started,
            failures,
            aborted_early,
            elapsed,
        })
    }
}

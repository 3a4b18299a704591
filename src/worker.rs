//! Worker routine: wait at the start barrier, then burn CPU
//!
//! Each worker passes through `Created -> WaitingAtBarrier -> Running ->
//! Terminated`. It suspends exactly once, at the barrier; after that it never
//! sleeps or yields until its last iteration is done.

use crate::affinity::CpuAffinity;
use crate::attr::{ThreadAttributeBuilder, ThreadAttributes};
use crate::barrier::{BarrierWait, StartBarrier};
use crate::clock::{spin_for, RunClock, TimeSource};
use crate::plan::ThreadRequest;
use crate::policy::SchedPolicy;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Busy-wait iterations every worker runs
pub const ITERATIONS: usize = 3;

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn as_opt_secs<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

/// Where workers announce their iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Stdout,
    Stderr,
    Silent,
}

impl Progress {
    pub fn line(self, args: std::fmt::Arguments<'_>) {
        // a closed pipe must not kill a worker mid-run
        let _ = match self {
            Progress::Stdout => writeln!(std::io::stdout().lock(), "{}", args),
            Progress::Stderr => writeln!(std::io::stderr().lock(), "{}", args),
            Progress::Silent => Ok(()),
        };
    }
}

/// Everything a worker needs, moved into its thread
#[derive(Debug, Clone)]
pub struct ThreadSpec {
    pub id: usize,
    pub policy: SchedPolicy,
    pub priority: i32,
    pub cpu_affinity: CpuAffinity,
    pub wait: Duration,
    pub barrier: Arc<StartBarrier>,
}

impl ThreadSpec {
    pub fn new(
        id: usize,
        request: ThreadRequest,
        cpu_affinity: CpuAffinity,
        wait: Duration,
        barrier: Arc<StartBarrier>,
    ) -> Self {
        Self {
            id,
            policy: request.policy,
            priority: request.policy.effective_priority(request.priority),
            cpu_affinity,
            wait,
            barrier,
        }
    }

    /// Launch attributes for this worker
    pub fn attributes(&self) -> ThreadAttributes {
        ThreadAttributeBuilder::new(self.policy)
            .priority(self.priority)
            .affinity(&self.cpu_affinity)
            .build()
    }
}

/// Timing of one busy-wait iteration, as offsets from the run epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationRecord {
    pub index: usize,
    #[serde(serialize_with = "as_secs")]
    pub started_at: Duration,
    #[serde(serialize_with = "as_secs")]
    pub finished_at: Duration,
    /// CPU the worker was on when the iteration ended
    pub cpu: Option<usize>,
}

/// What a worker saw, returned through join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerReport {
    pub id: usize,
    pub policy: SchedPolicy,
    pub priority: i32,
    #[serde(serialize_with = "as_secs")]
    pub arrived_at: Duration,
    #[serde(serialize_with = "as_opt_secs")]
    pub released_at: Option<Duration>,
    pub iterations: Vec<IterationRecord>,
}

impl WorkerReport {
    /// Start of the first busy-wait iteration
    pub fn first_start(&self) -> Option<Duration> {
        self.iterations.first().map(|it| it.started_at)
    }

    /// End of the last busy-wait iteration
    pub fn finished_at(&self) -> Option<Duration> {
        self.iterations.last().map(|it| it.finished_at)
    }

    pub fn completed(&self) -> bool {
        self.iterations.len() == ITERATIONS
    }
}

/// Body of every worker thread
pub fn run(spec: ThreadSpec, clock: RunClock, progress: Progress) -> WorkerReport {
    let mut report = WorkerReport {
        id: spec.id,
        policy: spec.policy,
        priority: spec.priority,
        arrived_at: Duration::ZERO,
        released_at: None,
        iterations: Vec::with_capacity(ITERATIONS),
    };

    match spec.barrier.wait() {
        BarrierWait::Released {
            arrived_at,
            released_at,
        } => {
            report.arrived_at = arrived_at;
            report.released_at = Some(released_at);
        }
        BarrierWait::Aborted { arrived_at } => {
            debug!(id = spec.id, "barrier aborted, skipping busy-wait");
            report.arrived_at = arrived_at;
            return report;
        }
    }

    for index in 0..ITERATIONS {
        progress.line(format_args!("Thread {} is running", spec.id));
        let started_at = clock.elapsed();
        let spent = spin_for(&clock, spec.wait);
        report.iterations.push(IterationRecord {
            index,
            started_at,
            finished_at: started_at + spent,
            cpu: nix::sched::sched_getcpu().ok(),
        });
    }
    report
}

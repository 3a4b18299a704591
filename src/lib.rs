//! schedprobe - real-time thread scheduling harness
//!
//! This library spawns worker threads with explicit scheduling attributes
//! (`SCHED_FIFO` or `SCHED_OTHER`, a static priority and a CPU affinity
//! mask), holds them at a shared start barrier, and then has each one
//! busy-wait through a fixed number of timed iterations so that preemption
//! and starvation between scheduling classes become visible.

pub mod affinity;
pub mod attr;
pub mod barrier;
pub mod cli;
pub mod clock;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod report;
pub mod rt_thread;
pub mod worker;

//! CPU affinity sets

use crate::error::{HarnessError, Result};
use nix::sched::{sched_getaffinity, CpuSet};
use nix::unistd::Pid;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Set of CPU indices a thread may run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuAffinity {
    cpus: BTreeSet<usize>,
}

impl CpuAffinity {
    /// Pin to exactly one CPU
    pub fn single(cpu: usize) -> Result<Self> {
        Self::from_cpus([cpu])
    }

    /// Build a set from explicit CPU indices
    pub fn from_cpus<I: IntoIterator<Item = usize>>(cpus: I) -> Result<Self> {
        let cpus: BTreeSet<usize> = cpus.into_iter().collect();
        if cpus.is_empty() {
            return Err(HarnessError::Configuration(
                "CPU affinity set is empty".to_string(),
            ));
        }
        let limit = CpuSet::count();
        if let Some(&cpu) = cpus.iter().find(|&&cpu| cpu >= limit) {
            return Err(HarnessError::Configuration(format!(
                "CPU {} is outside the affinity mask (limit {})",
                cpu, limit
            )));
        }
        Ok(Self { cpus })
    }

    /// Rebuild a set from a raw `cpu_set_t`
    pub fn from_cpu_set(set: &libc::cpu_set_t) -> Self {
        let cpus = (0..CpuSet::count())
            // SAFETY: the index is below CPU_SETSIZE
            .filter(|&cpu| unsafe { libc::CPU_ISSET(cpu, set) })
            .collect();
        Self { cpus }
    }

    /// Affinity of the calling thread
    pub fn current() -> nix::Result<Self> {
        let set = sched_getaffinity(Pid::from_raw(0))?;
        let cpus = (0..CpuSet::count())
            .filter(|&cpu| set.is_set(cpu).unwrap_or(false))
            .collect();
        Ok(Self { cpus })
    }

    /// Lowest CPU index in the set
    pub fn first(&self) -> Option<usize> {
        self.cpus.iter().next().copied()
    }

    pub fn contains(&self, cpu: usize) -> bool {
        self.cpus.contains(&cpu)
    }

    pub fn len(&self) -> usize {
        self.cpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cpus.iter().copied()
    }

    /// Render as a raw `cpu_set_t` for pthread attributes
    pub fn to_cpu_set(&self) -> libc::cpu_set_t {
        // SAFETY: cpu_set_t is a plain bitmask, all-zero is the empty set
        let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        for cpu in self.iter() {
            // SAFETY: every constructor keeps indices below CPU_SETSIZE
            unsafe { libc::CPU_SET(cpu, &mut set) };
        }
        set
    }
}

impl Default for CpuAffinity {
    fn default() -> Self {
        Self {
            cpus: BTreeSet::from([0]),
        }
    }
}

impl fmt::Display for CpuAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cpus: Vec<String> = self.cpus.iter().map(|c| c.to_string()).collect();
        write!(f, "{{{}}}", cpus.join(","))
    }
}

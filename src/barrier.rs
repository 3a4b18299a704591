//! Start barrier shared by every worker of a run
//!
//! Unlike `std::sync::Barrier`, the party count is not fixed up front. The
//! orchestrator arms the barrier once the spawn pass is over, with the number
//! of threads that were actually created, so a failed creation can never
//! leave the survivors waiting for a peer that does not exist.

use crate::clock::{RunClock, TimeSource};
use crate::error::{HarnessError, Result};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct BarrierState {
    parties: Option<usize>,
    arrived: usize,
    last_arrival: Duration,
    released_at: Option<Duration>,
    aborted: bool,
}

impl BarrierState {
    fn try_release(&mut self, now: Duration) -> bool {
        match self.parties {
            Some(parties) if self.arrived == parties && self.released_at.is_none() => {
                self.released_at = Some(now);
                true
            }
            _ => false,
        }
    }
}

/// Outcome of a single `wait` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierWait {
    /// Every party arrived; all were released together
    Released {
        arrived_at: Duration,
        released_at: Duration,
    },
    /// The run was torn down before the barrier could open
    Aborted { arrived_at: Duration },
}

/// One-shot barrier armed after the spawn pass
#[derive(Debug)]
pub struct StartBarrier {
    clock: RunClock,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl StartBarrier {
    pub fn new(clock: RunClock) -> Self {
        Self {
            clock,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        // a poisoned lock only means a worker panicked; the counters stay valid
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fix the party count and open the barrier if everyone is already here
    ///
    /// Fails when more workers have arrived than `parties`, which would mean
    /// the barrier was sized for threads that were never created.
    pub fn arm(&self, parties: usize) -> Result<()> {
        let mut state = self.lock();
        if state.parties.is_some() || state.arrived > parties {
            return Err(HarnessError::BarrierMismatch {
                parties,
                arrived: state.arrived,
            });
        }
        state.parties = Some(parties);
        debug!(parties, arrived = state.arrived, "start barrier armed");
        if state.try_release(self.clock.elapsed()) {
            self.cvar.notify_all();
        }
        Ok(())
    }

    /// Release every waiter without letting any of them run
    pub fn abort(&self) {
        let mut state = self.lock();
        if state.released_at.is_none() {
            warn!(arrived = state.arrived, "start barrier aborted");
            state.aborted = true;
            self.cvar.notify_all();
        }
    }

    /// Block until every party has arrived
    pub fn wait(&self) -> BarrierWait {
        let mut state = self.lock();
        let arrived_at = self.clock.elapsed();
        state.arrived += 1;
        state.last_arrival = state.last_arrival.max(arrived_at);
        if state.try_release(arrived_at) {
            self.cvar.notify_all();
        }
        loop {
            if let Some(released_at) = state.released_at {
                return BarrierWait::Released {
                    arrived_at,
                    released_at,
                };
            }
            if state.aborted {
                return BarrierWait::Aborted { arrived_at };
            }
            state = self.cvar.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Number of workers that reached the barrier so far
    pub fn arrived(&self) -> usize {
        self.lock().arrived
    }

    /// Offset of the latest arrival
    pub fn last_arrival(&self) -> Duration {
        self.lock().last_arrival
    }

    pub fn released_at(&self) -> Option<Duration> {
        self.lock().released_at
    }
}

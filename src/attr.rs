//! pthread creation attributes
//!
//! Translates a (policy, priority, affinity) triple into a `pthread_attr_t`.
//! Nothing here validates the priority: whatever the OS rejects while the
//! attributes are recorded is kept inside the bundle and reported as the
//! creation failure of the thread it was meant for.

use crate::affinity::CpuAffinity;
use crate::error::SpawnError;
use crate::policy::SchedPolicy;
use std::mem;

/// Builder for a single thread's launch attributes
#[derive(Debug, Clone)]
pub struct ThreadAttributeBuilder {
    policy: SchedPolicy,
    priority: i32,
    affinity: CpuAffinity,
}

impl ThreadAttributeBuilder {
    pub fn new(policy: SchedPolicy) -> Self {
        Self {
            policy,
            priority: 0,
            affinity: CpuAffinity::default(),
        }
    }

    /// Requested static priority (ignored for time-shared threads)
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn affinity(mut self, affinity: &CpuAffinity) -> Self {
        self.affinity = affinity.clone();
        self
    }

    /// Produce the attribute bundle
    ///
    /// Never fails outright; a failing step is carried in the result and
    /// surfaces when the bundle is handed to thread creation.
    pub fn build(self) -> ThreadAttributes {
        let priority = self.policy.effective_priority(self.priority);
        let mut attrs = ThreadAttributes {
            // SAFETY: zeroed storage, initialized by pthread_attr_init below
            raw: Box::new(unsafe { mem::zeroed() }),
            initialized: false,
            policy: self.policy,
            priority,
            pending: None,
        };

        // SAFETY: raw points at owned, boxed storage
        let rc = unsafe { libc::pthread_attr_init(&mut *attrs.raw) };
        if rc != 0 {
            attrs.pending = Some(SpawnError::from_code("pthread_attr_init", rc));
            return attrs;
        }
        attrs.initialized = true;

        let mut param: libc::sched_param = unsafe { mem::zeroed() };
        param.sched_priority = priority;
        let cpu_set = self.affinity.to_cpu_set();

        let raw: *mut libc::pthread_attr_t = &mut *attrs.raw;
        // SAFETY: raw was initialized above; param and cpu_set outlive the calls
        let steps = unsafe {
            [
                (
                    "pthread_attr_setinheritsched",
                    libc::pthread_attr_setinheritsched(raw, libc::PTHREAD_EXPLICIT_SCHED),
                ),
                (
                    "pthread_attr_setschedpolicy",
                    libc::pthread_attr_setschedpolicy(raw, self.policy.as_raw()),
                ),
                (
                    "pthread_attr_setschedparam",
                    libc::pthread_attr_setschedparam(raw, &param),
                ),
                (
                    "pthread_attr_setaffinity_np",
                    libc::pthread_attr_setaffinity_np(
                        raw,
                        mem::size_of::<libc::cpu_set_t>(),
                        &cpu_set,
                    ),
                ),
            ]
        };
        for (stage, rc) in steps {
            attrs.check(stage, rc);
        }
        attrs
    }
}

/// Initialized `pthread_attr_t`, destroyed on drop
///
/// Consumed by a single thread creation; never reused.
pub struct ThreadAttributes {
    raw: Box<libc::pthread_attr_t>,
    initialized: bool,
    policy: SchedPolicy,
    priority: i32,
    pending: Option<SpawnError>,
}

impl ThreadAttributes {
    fn check(&mut self, stage: &'static str, rc: libc::c_int) {
        if rc != 0 && self.pending.is_none() {
            self.pending = Some(SpawnError::from_code(stage, rc));
        }
    }

    pub fn policy(&self) -> SchedPolicy {
        self.policy
    }

    /// Priority recorded in the attributes (0 for time-shared)
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// First error the OS reported while recording the attributes
    pub fn pending_error(&self) -> Option<SpawnError> {
        self.pending
    }

    /// Pointer for `pthread_create`
    pub(crate) fn as_ptr(&self) -> *const libc::pthread_attr_t {
        &*self.raw
    }

    /// Policy as stored in the underlying `pthread_attr_t`
    pub fn raw_policy(&self) -> Option<libc::c_int> {
        if !self.initialized {
            return None;
        }
        let mut policy = 0;
        // SAFETY: raw is initialized
        let rc = unsafe { libc::pthread_attr_getschedpolicy(&*self.raw, &mut policy) };
        (rc == 0).then_some(policy)
    }

    /// Priority as stored in the underlying `pthread_attr_t`
    pub fn raw_priority(&self) -> Option<i32> {
        if !self.initialized {
            return None;
        }
        // SAFETY: raw is initialized; param is plain data
        let mut param: libc::sched_param = unsafe { mem::zeroed() };
        let rc = unsafe { libc::pthread_attr_getschedparam(&*self.raw, &mut param) };
        (rc == 0).then_some(param.sched_priority)
    }

    /// Inherit-scheduler flag as stored in the underlying `pthread_attr_t`
    pub fn raw_inherit_sched(&self) -> Option<libc::c_int> {
        if !self.initialized {
            return None;
        }
        let mut inherit = 0;
        // SAFETY: raw is initialized
        let rc = unsafe { libc::pthread_attr_getinheritsched(&*self.raw, &mut inherit) };
        (rc == 0).then_some(inherit)
    }

    /// CPU set as stored in the underlying `pthread_attr_t`
    pub fn raw_affinity(&self) -> Option<CpuAffinity> {
        if !self.initialized {
            return None;
        }
        // SAFETY: raw is initialized; cpu_set_t is plain data
        let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
        let rc = unsafe {
            libc::pthread_attr_getaffinity_np(
                &*self.raw,
                mem::size_of::<libc::cpu_set_t>(),
                &mut set,
            )
        };
        (rc == 0).then(|| CpuAffinity::from_cpu_set(&set))
    }
}

impl Drop for ThreadAttributes {
    fn drop(&mut self) {
        if self.initialized {
            // SAFETY: initialized exactly once and destroyed exactly once
            unsafe { libc::pthread_attr_destroy(&mut *self.raw) };
        }
    }
}

impl std::fmt::Debug for ThreadAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadAttributes")
            .field("policy", &self.policy)
            .field("priority", &self.priority)
            .field("pending", &self.pending)
            .finish()
    }
}

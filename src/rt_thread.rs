//! Threads created straight through `pthread_create`
//!
//! `std::thread::Builder` has no way to pass scheduling attributes, and
//! setting them from inside the new thread would let it run a moment under
//! the wrong policy. Creating the thread with the attributes applied means
//! the OS either starts it exactly as requested or refuses to start it.

use crate::attr::ThreadAttributes;
use crate::error::{JoinError, SpawnError};
use nix::errno::Errno;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

type Payload<T> = Box<dyn FnOnce() -> T + Send>;

extern "C" fn trampoline<T: Send + 'static>(arg: *mut c_void) -> *mut c_void {
    // SAFETY: arg came from Box::into_raw in spawn_with and is consumed once
    let body: Payload<T> = *unsafe { Box::from_raw(arg as *mut Payload<T>) };
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => Box::into_raw(Box::new(value)) as *mut c_void,
        Err(_) => ptr::null_mut(),
    }
}

/// Owned handle to a thread created with explicit attributes
///
/// Dropping the handle without joining detaches the thread.
#[derive(Debug)]
pub struct RtJoinHandle<T> {
    thread: libc::pthread_t,
    joined: bool,
    _result: PhantomData<T>,
}

/// Create a thread running `f` with the given attributes
///
/// The attributes are consumed: they are destroyed right after the creation
/// attempt, whether it succeeded or not.
pub fn spawn_with<F, T>(attrs: ThreadAttributes, f: F) -> Result<RtJoinHandle<T>, SpawnError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if let Some(err) = attrs.pending_error() {
        return Err(err);
    }

    let payload: Box<Payload<T>> = Box::new(Box::new(f));
    let arg = Box::into_raw(payload) as *mut c_void;
    let mut thread: libc::pthread_t = 0;

    // SAFETY: attrs is initialized; arg stays valid until the new thread
    // takes ownership of it, or is reclaimed below if creation fails
    let rc = unsafe { libc::pthread_create(&mut thread, attrs.as_ptr(), trampoline::<T>, arg) };
    if rc != 0 {
        // SAFETY: no thread was started, so arg is still ours
        drop(unsafe { Box::from_raw(arg as *mut Payload<T>) });
        return Err(SpawnError::from_code("pthread_create", rc));
    }

    Ok(RtJoinHandle {
        thread,
        joined: false,
        _result: PhantomData,
    })
}

impl<T> RtJoinHandle<T> {
    /// Wait for the thread to finish and take its return value
    pub fn join(mut self) -> Result<T, JoinError> {
        let mut ret: *mut c_void = ptr::null_mut();
        // SAFETY: thread is a live, joinable thread owned by this handle
        let rc = unsafe { libc::pthread_join(self.thread, &mut ret) };
        self.joined = true;
        if rc != 0 {
            return Err(JoinError::Os(Errno::from_raw(rc)));
        }
        if ret.is_null() {
            return Err(JoinError::Panicked);
        }
        // SAFETY: a non-null return was produced by Box::into_raw in trampoline::<T>
        Ok(*unsafe { Box::from_raw(ret as *mut T) })
    }
}

impl<T> Drop for RtJoinHandle<T> {
    fn drop(&mut self) {
        if !self.joined {
            // SAFETY: thread was never joined, detaching releases it once done
            unsafe { libc::pthread_detach(self.thread) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::CpuAffinity;
    use crate::attr::ThreadAttributeBuilder;
    use crate::error::ErrorKind;
    use crate::policy::SchedPolicy;

    fn allowed_cpu() -> CpuAffinity {
        let cpu = CpuAffinity::current().unwrap().first().unwrap();
        CpuAffinity::single(cpu).unwrap()
    }

    fn time_shared() -> ThreadAttributes {
        ThreadAttributeBuilder::new(SchedPolicy::TimeShared)
            .affinity(&allowed_cpu())
            .build()
    }

    #[test]
    fn test_spawn_and_join_returns_value() {
        let handle = spawn_with(time_shared(), || 40 + 2).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_thread_runs_on_requested_cpu() {
        let affinity = allowed_cpu();
        let attrs = ThreadAttributeBuilder::new(SchedPolicy::TimeShared)
            .affinity(&affinity)
            .build();
        let handle = spawn_with(attrs, || CpuAffinity::current().unwrap()).unwrap();
        assert_eq!(handle.join().unwrap(), affinity);
    }

    #[test]
    fn test_moved_values_come_back() {
        let data = vec![1, 2, 3];
        let handle = spawn_with(time_shared(), move || data.iter().sum::<i32>()).unwrap();
        assert_eq!(handle.join().unwrap(), 6);
    }

    #[test]
    fn test_panic_reported_on_join() {
        let handle = spawn_with(time_shared(), || -> u8 { panic!("boom") }).unwrap();
        assert_eq!(handle.join().unwrap_err(), JoinError::Panicked);
    }

    #[test]
    fn test_out_of_range_fifo_priority_fails_creation() {
        let attrs = ThreadAttributeBuilder::new(SchedPolicy::RealtimeFifo)
            .priority(200)
            .affinity(&allowed_cpu())
            .build();
        let err = spawn_with(attrs, || ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchedulingUnavailable);
    }

    #[test]
    fn test_dropped_handle_detaches() {
        let handle = spawn_with(time_shared(), || ()).unwrap();
        drop(handle);
    }
}

//! Completion signals for frames and compute dispatches.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct FenceState {
    signaled: Mutex<bool>,
    cond: Condvar,
}

/// A one-shot completion signal shared between a producer and its waiters.
///
/// Cloning a fence shares the same signal. Once signaled it stays signaled.
#[derive(Clone)]
pub struct GpuFence {
    state: Arc<FenceState>,
}

impl GpuFence {
    /// Create an unsignaled fence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(false)
    }

    /// Create a fence that is already signaled.
    #[must_use]
    pub fn signaled() -> Self {
        Self::with_state(true)
    }

    fn with_state(signaled: bool) -> Self {
        Self {
            state: Arc::new(FenceState {
                signaled: Mutex::new(signaled),
                cond: Condvar::new(),
            }),
        }
    }

    /// Signal the fence and wake every waiter.
    pub fn signal(&self) {
        let mut signaled = self.state.signaled.lock();
        *signaled = true;
        self.state.cond.notify_all();
    }

    /// Whether the fence has been signaled.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        *self.state.signaled.lock()
    }

    /// Block until the fence is signaled.
    pub fn wait(&self) {
        let mut signaled = self.state.signaled.lock();
        while !*signaled {
            self.state.cond.wait(&mut signaled);
        }
    }

    /// Block until the fence is signaled or `timeout` elapses.
    ///
    /// Returns `true` if the fence was signaled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.state.signaled.lock();
        while !*signaled {
            if self
                .state
                .cond
                .wait_until(&mut signaled, deadline)
                .timed_out()
            {
                return *signaled;
            }
        }
        true
    }
}

impl Default for GpuFence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GpuFence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuFence")
            .field("signaled", &self.is_signaled())
            .finish()
    }
}

//! Single-shot deadline made cheap to reschedule continuously.
//!
//! Each armed deadline is one spawned task sleeping until it; rescheduling
//! re-arms only when the armed task would fire too late. A task that wakes
//! early relative to a deadline that has since moved later re-arms itself
//! instead of firing, so a steady stream of reschedules costs almost no
//! timer churn.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{self, Instant};

/// Timeout whose deadline can be pushed around cheaply.
///
/// The callback runs exactly once per settled deadline, on the tokio runtime
/// the arming [`reschedule`] call ran on; it is invoked without any internal
/// lock held, so it may call [`reschedule`] itself. Dropping the handle
/// cancels any armed timer.
///
/// [`reschedule`]: ReschedulableTimeout::reschedule
pub struct ReschedulableTimeout {
    shared: Arc<Shared>,
}

struct Shared {
    callback: Box<dyn Fn() + Send + Sync>,
    state: Mutex<TimeoutState>,
}

struct TimeoutState {
    /// Most recently requested fire time. Distinct from the armed deadline:
    /// the armed task may fire earlier and then re-arm.
    target: Instant,
    armed: Option<ArmedTimer>,
    /// Invalidates armed tasks that were superseded after their sleep ended
    /// but before they took the state lock.
    epoch: u64,
}

struct ArmedTimer {
    deadline: Instant,
    handle: AbortHandle,
}

impl ReschedulableTimeout {
    /// Creates an idle timeout that will invoke `callback` on expiry.
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                callback: Box::new(callback),
                state: Mutex::new(TimeoutState {
                    target: Instant::now(),
                    armed: None,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Moves the deadline to `delay` from now.
    ///
    /// Re-arms the underlying timer only when none is armed or the armed one
    /// would fire after the new deadline. An armed timer firing earlier is
    /// left in place; it corrects itself on fire.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn reschedule(&self, delay: Duration) {
        let mut state = self.shared.state.lock().unwrap();
        state.target = Instant::now() + delay;
        let needs_rearm = match &state.armed {
            Some(armed) => armed.deadline > state.target,
            None => true,
        };
        if needs_rearm {
            let deadline = state.target;
            Shared::arm(&self.shared, &mut state, deadline);
        }
    }

    /// Cancels any armed timer and returns to idle. No-op when idle.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.epoch += 1;
        if let Some(armed) = state.armed.take() {
            armed.handle.abort();
        }
    }

    /// Returns `true` while a timer is armed.
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().unwrap().armed.is_some()
    }
}

impl Shared {
    /// Arms a fresh timer task at `deadline`, superseding any armed one.
    fn arm(this: &Arc<Shared>, state: &mut MutexGuard<'_, TimeoutState>, deadline: Instant) {
        if let Some(previous) = state.armed.take() {
            previous.handle.abort();
        }
        state.epoch += 1;
        let epoch = state.epoch;
        let shared = Arc::clone(this);
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            Shared::fire(shared, epoch);
        });
        state.armed = Some(ArmedTimer {
            deadline,
            handle: task.abort_handle(),
        });
    }

    fn fire(this: Arc<Shared>, epoch: u64) {
        let expired = {
            let mut state = this.state.lock().unwrap();
            if state.epoch != epoch {
                // Superseded between waking and taking the lock.
                return;
            }
            state.armed = None;
            if Instant::now() < state.target {
                // Woke for a deadline that has since moved later; chase it.
                tracing::trace!("timeout woke early, re-arming at moved deadline");
                let deadline = state.target;
                Shared::arm(&this, &mut state, deadline);
                false
            } else {
                true
            }
        };
        if expired {
            tracing::trace!("timeout expired");
            (this.callback)();
        }
    }
}

impl Drop for ReschedulableTimeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ReschedulableTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock().unwrap();
        f.debug_struct("ReschedulableTimeout")
            .field("armed", &state.armed.is_some())
            .field("target", &state.target)
            .finish()
    }
}

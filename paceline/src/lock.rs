use std::fmt;

use crate::error::{AcquireError, CapacityError, OverReleaseError};
use crate::scoped::ScopedAcquire;
use crate::semaphore::{Acquire, PrioritySemaphore};

/// Mutual-exclusion lock with priority-ordered granting.
///
/// A [`PrioritySemaphore`] fixed at capacity 1: priority ordering, fairness,
/// and cancellation behavior are inherited unchanged, but
/// [`set_capacity`](PriorityLock::set_capacity) always fails.
pub struct PriorityLock {
    semaphore: PrioritySemaphore,
}

impl PriorityLock {
    /// Creates an unlocked lock.
    pub fn new() -> Self {
        Self {
            semaphore: PrioritySemaphore::new(1),
        }
    }

    /// Locks at the default priority, suspending while the lock is held.
    pub fn acquire(&self) -> Acquire<'_> {
        self.semaphore.acquire()
    }

    /// Locks at the given priority. Higher priorities are granted sooner;
    /// equal priorities are served in arrival order.
    pub fn acquire_with_priority(&self, priority: i64) -> Acquire<'_> {
        self.semaphore.acquire_with_priority(priority)
    }

    /// Manually unlocks; pairs with [`Permit::forget`](crate::Permit::forget).
    ///
    /// # Errors
    ///
    /// Fails with [`OverReleaseError`] when the lock is not held.
    pub fn release(&self) -> Result<(), OverReleaseError> {
        self.semaphore.release()
    }

    /// Always fails: the capacity of a lock is fixed at one.
    pub fn set_capacity(&self, _new_capacity: usize) -> Result<(), CapacityError> {
        Err(CapacityError::Fixed)
    }

    /// Fails every queued waiter with a clone of `error`. The current holder
    /// is unaffected.
    pub fn cancel_waiting(&self, error: AcquireError) {
        self.semaphore.cancel_waiting(error);
    }

    /// Returns `true` if an immediate [`acquire`](PriorityLock::acquire)
    /// would suspend.
    pub fn is_locked(&self) -> bool {
        self.semaphore.is_locked()
    }

    /// Number of queued acquires.
    pub fn num_waiting(&self) -> usize {
        self.semaphore.num_waiting()
    }

    /// Permits currently grantable: 1 when unlocked, 0 when held.
    pub fn available_permits(&self) -> isize {
        self.semaphore.available_permits()
    }

    /// Returns a scoped-acquisition wrapper pinned to `priority`.
    pub fn scoped(&self, priority: i64) -> ScopedAcquire<'_> {
        self.semaphore.scoped(priority)
    }
}

impl Default for PriorityLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PriorityLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityLock")
            .field("locked", &self.is_locked())
            .field("waiters", &self.num_waiting())
            .finish()
    }
}

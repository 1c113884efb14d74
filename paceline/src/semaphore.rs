use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};

use crate::error::{AcquireError, CapacityError, OverReleaseError};
use crate::scoped::ScopedAcquire;
use crate::wait_queue::{WaitQueue, WaitStatus, WaiterKey};

/// Counting semaphore with adjustable capacity and priority-ordered granting.
///
/// Waiters are granted strictly by descending priority, then by arrival
/// order. The ordering is global: a request arriving while older waiters are
/// queued suspends even if spare permits exist, so late arrivals can never
/// steal a permit from the queue.
///
/// Capacity can be raised or lowered at any time with [`set_capacity`].
/// Lowering never revokes permits already held; the semaphore instead runs a
/// deficit (`available_permits` goes negative) that is repaid as permits come
/// back.
///
/// All operations complete synchronously except the future returned by
/// [`acquire`], which suspends while the semaphore is contended. Every
/// mutation is serialized behind the instance's own lock, so concurrent use
/// can never corrupt the permit accounting; misuse surfaces as an explicit
/// error ([`OverReleaseError`], [`CapacityError`]), never as silent state
/// damage.
///
/// [`acquire`]: PrioritySemaphore::acquire
/// [`set_capacity`]: PrioritySemaphore::set_capacity
pub struct PrioritySemaphore {
    inner: Mutex<Inner>,
}

struct Inner {
    /// Permits currently grantable. Negative after a capacity shrink while
    /// more permits are held than the new capacity allows.
    available: isize,
    capacity: usize,
    queue: WaitQueue,
}

/// Permit held between a successful acquire and its release.
///
/// Dropping the permit releases it back to the semaphore and grants the next
/// waiter in line. [`forget`](Permit::forget) detaches the permit instead,
/// leaving the release to a later manual [`release`].
///
/// [`release`]: PrioritySemaphore::release
pub struct Permit<'a> {
    semaphore: &'a PrioritySemaphore,
    released: bool,
}

/// Future returned by [`acquire`], resolving to a [`Permit`].
///
/// Cancel-safe: dropping the future abandons the wait, and a permit that was
/// already assigned to it is returned to the semaphore and passed on to the
/// next eligible waiter.
///
/// [`acquire`]: PrioritySemaphore::acquire
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Acquire<'a> {
    semaphore: &'a PrioritySemaphore,
    priority: i64,
    key: Option<WaiterKey>,
}

impl PrioritySemaphore {
    /// Maximum capacity of a semaphore.
    pub const MAX_CAPACITY: usize = isize::MAX as usize;

    /// Creates a semaphore with the given initial capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](Self::MAX_CAPACITY).
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity <= Self::MAX_CAPACITY,
            "capacity exceeds MAX_CAPACITY"
        );
        Self {
            inner: Mutex::new(Inner {
                available: capacity as isize,
                capacity,
                queue: WaitQueue::new(),
            }),
        }
    }

    /// Acquires one permit at the default priority, suspending while the
    /// semaphore is contended.
    pub fn acquire(&self) -> Acquire<'_> {
        self.acquire_with_priority(0)
    }

    /// Acquires one permit at the given priority. Higher priorities are
    /// granted sooner; equal priorities are served in arrival order.
    pub fn acquire_with_priority(&self, priority: i64) -> Acquire<'_> {
        Acquire {
            semaphore: self,
            priority,
            key: None,
        }
    }

    /// Returns one permit, granting the head of the queue if anyone waits.
    ///
    /// Usually called implicitly by dropping a [`Permit`]; calling it
    /// manually pairs with [`Permit::forget`].
    ///
    /// # Errors
    ///
    /// Fails with [`OverReleaseError`] when every permit is already back,
    /// leaving the state untouched.
    pub fn release(&self) -> Result<(), OverReleaseError> {
        let mut inner = self.lock();
        if inner.available >= inner.capacity as isize {
            return Err(OverReleaseError(()));
        }
        inner.available += 1;
        inner.grant_next();
        Ok(())
    }

    /// Changes the capacity, applying the difference to the available count.
    ///
    /// Raising the capacity by `delta` grants up to `delta` queued waiters,
    /// in priority order, stopping early if the queue empties. Lowering it
    /// never revokes held permits; `available_permits` may go negative and
    /// further grants wait until releases repay the deficit.
    ///
    /// # Errors
    ///
    /// Fails with [`CapacityError::TooLarge`] above
    /// [`MAX_CAPACITY`](Self::MAX_CAPACITY). A [`PriorityLock`] rejects any
    /// capacity change with [`CapacityError::Fixed`].
    ///
    /// [`PriorityLock`]: crate::PriorityLock
    pub fn set_capacity(&self, new_capacity: usize) -> Result<(), CapacityError> {
        if new_capacity > Self::MAX_CAPACITY {
            return Err(CapacityError::TooLarge);
        }
        let mut inner = self.lock();
        let delta = new_capacity as isize - inner.capacity as isize;
        inner.available += delta;
        inner.capacity = new_capacity;
        for _ in 0..delta.max(0) {
            if !inner.grant_next() {
                break;
            }
        }
        tracing::debug!(
            capacity = new_capacity,
            available = inner.available,
            "semaphore capacity changed"
        );
        Ok(())
    }

    /// Fails every currently queued waiter with a clone of `error`.
    ///
    /// Callers already holding a permit, and waiters that were already
    /// assigned one, are unaffected. Intended for teardown, before the
    /// semaphore is dropped.
    pub fn cancel_waiting(&self, error: AcquireError) {
        let mut inner = self.lock();
        let failed = inner.queue.fail_waiting(&error);
        if failed > 0 {
            tracing::debug!(waiters = failed, reason = error.reason(), "cancelled pending acquires");
        }
    }

    /// Returns `true` if an immediate [`acquire`] would suspend: no permit is
    /// available, or older waiters are still queued ahead of it.
    ///
    /// [`acquire`]: PrioritySemaphore::acquire
    pub fn is_locked(&self) -> bool {
        self.lock().is_contended()
    }

    /// Permits currently grantable. Negative while the semaphore runs a
    /// deficit after a capacity shrink.
    pub fn available_permits(&self) -> isize {
        self.lock().available
    }

    /// Current ceiling on simultaneously held permits.
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of queued acquires, including those assigned a permit they
    /// have not picked up yet.
    pub fn num_waiting(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns a scoped-acquisition wrapper pinned to `priority`.
    ///
    /// The wrapper implements [`Acquirable`](crate::Acquirable) just like the
    /// semaphore itself, so it can stand in for it wherever a scoped acquire
    /// at a non-default priority is wanted.
    pub fn scoped(&self, priority: i64) -> ScopedAcquire<'_> {
        ScopedAcquire::new(self, priority)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Inner {
    fn is_contended(&self) -> bool {
        self.available <= 0 || !self.queue.is_empty()
    }

    /// Hands one permit to the highest-ranked waiter still waiting.
    ///
    /// Not gated on `available > 0`: a release with a queued waiter is a
    /// direct hand-off even while the semaphore runs a deficit.
    fn grant_next(&mut self) -> bool {
        if self.queue.grant_first_waiting() {
            self.available -= 1;
            tracing::trace!(available = self.available, "permit granted to waiter");
            true
        } else {
            false
        }
    }

    /// Grants as many additional waiters as spare permits allow. Runs after
    /// every concluded wait to absorb releases and capacity increases that
    /// landed while that wait was pending.
    fn grant_while_available(&mut self) {
        while self.available > 0 {
            if !self.grant_next() {
                break;
            }
        }
    }
}

impl<'a> Future for Acquire<'a> {
    type Output = Result<Permit<'a>, AcquireError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut inner = this.semaphore.lock();

        let Some(key) = this.key else {
            // Uncontended: take a permit without queueing. A non-empty queue
            // forces even a late arrival with spare permits to line up.
            if !inner.is_contended() {
                inner.available -= 1;
                return Poll::Ready(Ok(Permit::new(this.semaphore)));
            }
            let key = inner.queue.push(this.priority, cx.waker().clone());
            this.key = Some(key);
            return Poll::Pending;
        };

        match inner.queue.status(key) {
            WaitStatus::Waiting => {
                inner.queue.set_waker(key, cx.waker());
                Poll::Pending
            }
            WaitStatus::Granted => {
                this.key = None;
                inner.queue.remove(key);
                inner.grant_while_available();
                Poll::Ready(Ok(Permit::new(this.semaphore)))
            }
            WaitStatus::Failed => {
                this.key = None;
                let error = inner
                    .queue
                    .remove(key)
                    .and_then(crate::wait_queue::Waiter::into_error)
                    .expect("failed waiter lost its error");
                inner.grant_while_available();
                Poll::Ready(Err(error))
            }
        }
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let mut inner = self.semaphore.lock();
        let Some(waiter) = inner.queue.remove(key) else {
            return;
        };
        if waiter.was_granted() {
            // A permit was assigned to this waiter but never picked up.
            // Restore it and pass it to the next eligible waiter before the
            // cancellation proceeds.
            inner.available += 1;
            inner.grant_next();
        }
        inner.grant_while_available();
    }
}

impl<'a> Permit<'a> {
    fn new(semaphore: &'a PrioritySemaphore) -> Self {
        Self {
            semaphore,
            released: false,
        }
    }

    /// Detaches the permit without releasing it.
    ///
    /// The permit count stays reduced until a manual
    /// [`release`](PrioritySemaphore::release) repays it.
    pub fn forget(mut self) {
        self.released = true;
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if self.semaphore.release().is_err() {
            // Only reachable when manual `release` calls were mixed with
            // held permits.
            tracing::warn!("dropped permit exceeded semaphore capacity");
        }
    }
}

impl fmt::Debug for PrioritySemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("PrioritySemaphore")
            .field("available", &inner.available)
            .field("capacity", &inner.capacity)
            .field("waiters", &inner.queue.len())
            .finish()
    }
}

impl fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("released", &self.released)
            .finish()
    }
}

impl fmt::Debug for Acquire<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire")
            .field("priority", &self.priority)
            .field("queued", &self.key.is_some())
            .finish()
    }
}

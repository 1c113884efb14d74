use std::sync::Arc;

use thiserror::Error;

/// Error resolved by a pending [`Acquire`] that was failed by
/// [`cancel_waiting`].
///
/// Carries the reason supplied by the caller that tore the semaphore down;
/// every waiter pending at that moment receives a clone.
///
/// [`Acquire`]: crate::Acquire
/// [`cancel_waiting`]: crate::PrioritySemaphore::cancel_waiting
#[derive(Debug, Clone, Error)]
#[error("acquire aborted: {reason}")]
pub struct AcquireError {
    reason: Arc<str>,
}

impl AcquireError {
    /// Creates an error with the given reason.
    pub fn new(reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason supplied to [`cancel_waiting`].
    ///
    /// [`cancel_waiting`]: crate::PrioritySemaphore::cancel_waiting
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Error returned by [`release`] when every permit is already back.
///
/// Guards against double-release bugs: a release that would push
/// `available` past `capacity` is rejected instead of silently corrupting
/// the permit count.
///
/// [`release`]: crate::PrioritySemaphore::release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("semaphore released more times than acquired")]
pub struct OverReleaseError(pub(crate) ());

/// Error returned by [`set_capacity`].
///
/// [`set_capacity`]: crate::PrioritySemaphore::set_capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// The capacity of a [`PriorityLock`](crate::PriorityLock) is fixed at
    /// one and cannot be changed.
    #[error("capacity of a priority lock cannot be changed")]
    Fixed,
    /// The requested capacity exceeds
    /// [`MAX_CAPACITY`](crate::PrioritySemaphore::MAX_CAPACITY).
    #[error("requested capacity exceeds the supported maximum")]
    TooLarge,
}

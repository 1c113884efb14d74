//! Scoped acquisition: one interface for "enter, then release on drop".
//!
//! [`Acquirable`] is the explicit enter/exit seam: `enter` resolves to a
//! [`Permit`](crate::Permit) and the permit's drop is the exit. The
//! semaphore and lock implement it at the default priority;
//! [`ScopedAcquire`] carries a chosen priority and stands in for its target
//! wherever one is accepted.

use crate::lock::PriorityLock;
use crate::semaphore::{Acquire, PrioritySemaphore};

/// Common interface for scoped acquisition.
///
/// `enter` suspends until a permit is granted; releasing is the permit's
/// drop, which runs on every exit path. If `enter` itself fails or its
/// future is dropped before completion, no release is owed.
pub trait Acquirable {
    /// Starts a scoped acquisition.
    fn enter(&self) -> Acquire<'_>;
}

impl Acquirable for PrioritySemaphore {
    fn enter(&self) -> Acquire<'_> {
        self.acquire()
    }
}

impl Acquirable for PriorityLock {
    fn enter(&self) -> Acquire<'_> {
        self.acquire()
    }
}

/// Scoped-acquisition wrapper pinned to a priority.
///
/// Obtained from [`PrioritySemaphore::scoped`] or [`PriorityLock::scoped`];
/// a drop-in for the target itself when priority 0 does not suffice.
///
/// ```
/// use paceline::{Acquirable, PrioritySemaphore};
///
/// async fn guarded(gate: &impl Acquirable) {
///     let _permit = gate.enter().await.unwrap();
///     // critical section
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let semaphore = PrioritySemaphore::new(1);
/// guarded(&semaphore).await;          // default priority
/// guarded(&semaphore.scoped(8)).await; // urgent
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScopedAcquire<'a> {
    semaphore: &'a PrioritySemaphore,
    priority: i64,
}

impl<'a> ScopedAcquire<'a> {
    /// Creates a wrapper acquiring `semaphore` at `priority`.
    ///
    /// Equivalent to [`PrioritySemaphore::scoped`].
    pub fn new(semaphore: &'a PrioritySemaphore, priority: i64) -> Self {
        Self {
            semaphore,
            priority,
        }
    }

    /// The priority every `enter` uses.
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

impl Acquirable for ScopedAcquire<'_> {
    fn enter(&self) -> Acquire<'_> {
        self.semaphore.acquire_with_priority(self.priority)
    }
}

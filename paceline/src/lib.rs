//! # paceline
//!
//! **Priority-aware coordination primitives for event-driven async code.**
//!
//! - [`PrioritySemaphore`]: counting semaphore with an adjustable capacity
//!   and strict priority-then-arrival granting
//! - [`PriorityLock`]: the semaphore fixed at capacity 1 (mutual exclusion)
//! - [`ScopedAcquire`] / [`Acquirable`]: scoped acquisition at a chosen
//!   priority, releasing on every exit path
//! - [`ReschedulableTimeout`]: single-shot deadline that coalesces repeated
//!   rescheduling into minimal timer churn
//! - [`Debouncer`]: identity-keyed, time-windowed suppression filter
//!
//! ## Quick Start
//! ```rust
//! use paceline::PrioritySemaphore;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Bound concurrent work to 2 outstanding operations.
//!     let gate = PrioritySemaphore::new(2);
//!
//!     let routine = gate.acquire().await.unwrap();
//!
//!     // Urgent requests overtake queued routine ones.
//!     let urgent = gate.acquire_with_priority(10).await.unwrap();
//!
//!     // Permits release on drop and wake the next waiter in line.
//!     drop(routine);
//!     drop(urgent);
//!
//!     // Capacity can change at runtime; held permits are never revoked.
//!     gate.set_capacity(4).unwrap();
//! }
//! ```
//!
//! ## Fairness
//!
//! Grants strictly follow descending priority, then arrival order — even
//! when permits are spare: a request that arrives while older waiters are
//! queued lines up behind them instead of stealing a permit.
//!
//! Every acquire future is cancel-safe. Dropping one that was already
//! assigned a permit returns that permit and passes it to the next eligible
//! waiter before the cancellation completes.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub, missing_debug_implementations)]
#![deny(rust_2018_idioms)]

mod debounce;
mod error;
mod lock;
mod scoped;
mod semaphore;
mod timeout;
mod wait_queue;

pub use debounce::Debouncer;
pub use error::{AcquireError, CapacityError, OverReleaseError};
pub use lock::PriorityLock;
pub use scoped::{Acquirable, ScopedAcquire};
pub use semaphore::{Acquire, Permit, PrioritySemaphore};
pub use timeout::ReschedulableTimeout;

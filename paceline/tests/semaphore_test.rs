use std::task::Poll;

use futures::poll;
use paceline::{AcquireError, Permit, PrioritySemaphore};

fn expect_permit<'a>(polled: Poll<Result<Permit<'a>, AcquireError>>) -> Permit<'a> {
    match polled {
        Poll::Ready(Ok(permit)) => permit,
        Poll::Ready(Err(error)) => panic!("acquire failed: {error}"),
        Poll::Pending => panic!("acquire still pending"),
    }
}

#[tokio::test]
async fn fast_path_acquire_and_release() {
    let sem = PrioritySemaphore::new(2);
    assert_eq!(sem.available_permits(), 2);
    assert_eq!(sem.capacity(), 2);
    assert!(!sem.is_locked());

    let first = sem.acquire().await.unwrap();
    let second = sem.acquire().await.unwrap();
    assert_eq!(sem.available_permits(), 0);
    assert!(sem.is_locked());

    drop(first);
    assert_eq!(sem.available_permits(), 1);
    assert!(!sem.is_locked());

    drop(second);
    assert_eq!(sem.available_permits(), 2);
}

#[tokio::test]
async fn release_grants_queued_waiter() {
    let sem = PrioritySemaphore::new(1);
    let held = sem.acquire().await.unwrap();

    let mut waiter = sem.acquire();
    assert!(poll!(&mut waiter).is_pending());
    assert_eq!(sem.num_waiting(), 1);

    drop(held);
    let permit = expect_permit(poll!(&mut waiter));
    assert_eq!(sem.available_permits(), 0);
    assert_eq!(sem.num_waiting(), 0);
    drop(permit);
}

#[tokio::test]
async fn over_release_is_rejected() {
    let sem = PrioritySemaphore::new(1);
    let error = sem.release().unwrap_err();
    assert_eq!(
        error.to_string(),
        "semaphore released more times than acquired"
    );
    // The failed release must leave the state untouched.
    assert_eq!(sem.available_permits(), 1);
    assert_eq!(sem.capacity(), 1);
}

#[tokio::test]
async fn forget_pairs_with_manual_release() {
    let sem = PrioritySemaphore::new(1);

    let permit = sem.acquire().await.unwrap();
    permit.forget();
    assert_eq!(sem.available_permits(), 0);

    sem.release().unwrap();
    assert_eq!(sem.available_permits(), 1);
    assert!(sem.release().is_err());
}

#[tokio::test]
async fn zero_capacity_semaphore_starts_locked() {
    let sem = PrioritySemaphore::new(0);
    assert!(sem.is_locked());
    assert_eq!(sem.available_permits(), 0);

    let mut waiter = sem.acquire();
    assert!(poll!(&mut waiter).is_pending());
    assert_eq!(sem.num_waiting(), 1);
}

#[tokio::test]
async fn debug_reports_counts() {
    let sem = PrioritySemaphore::new(3);
    let rendered = format!("{sem:?}");
    assert!(rendered.contains("available: 3"));
    assert!(rendered.contains("capacity: 3"));
}

use std::sync::{Arc, Mutex};
use std::task::Poll;
use std::time::Duration;

use futures::poll;
use paceline::{AcquireError, Permit, PrioritySemaphore};
use tokio::time::sleep;

fn expect_permit<'a>(polled: Poll<Result<Permit<'a>, AcquireError>>) -> Permit<'a> {
    match polled {
        Poll::Ready(Ok(permit)) => permit,
        Poll::Ready(Err(error)) => panic!("acquire failed: {error}"),
        Poll::Pending => panic!("acquire still pending"),
    }
}

#[tokio::test]
async fn grants_follow_priority_then_arrival() {
    let sem = PrioritySemaphore::new(1);
    let held = sem.acquire().await.unwrap();

    let mut first = sem.acquire_with_priority(5);
    let mut second = sem.acquire_with_priority(5);
    let mut urgent = sem.acquire_with_priority(10);
    assert!(poll!(&mut first).is_pending());
    assert!(poll!(&mut second).is_pending());
    assert!(poll!(&mut urgent).is_pending());

    // One permit frees up: the highest priority wins despite arriving last.
    drop(held);
    let urgent_permit = expect_permit(poll!(&mut urgent));
    assert!(poll!(&mut first).is_pending());
    assert!(poll!(&mut second).is_pending());

    // Equal priorities are served in arrival order.
    drop(urgent_permit);
    let first_permit = expect_permit(poll!(&mut first));
    assert!(poll!(&mut second).is_pending());

    drop(first_permit);
    let second_permit = expect_permit(poll!(&mut second));
    drop(second_permit);
}

#[tokio::test]
async fn negative_priorities_rank_below_default() {
    let sem = PrioritySemaphore::new(1);
    let held = sem.acquire().await.unwrap();

    let mut background = sem.acquire_with_priority(-10);
    let mut normal = sem.acquire();
    assert!(poll!(&mut background).is_pending());
    assert!(poll!(&mut normal).is_pending());

    drop(held);
    let normal_permit = expect_permit(poll!(&mut normal));
    assert!(poll!(&mut background).is_pending());

    drop(normal_permit);
    expect_permit(poll!(&mut background));
}

#[tokio::test]
async fn late_arrival_waits_behind_unclaimed_grant() {
    let sem = PrioritySemaphore::new(1);
    let held = sem.acquire().await.unwrap();

    let mut earlier = sem.acquire();
    assert!(poll!(&mut earlier).is_pending());

    // Growing the capacity hands the new permit to the queued waiter; the
    // released one then has nobody left to go to.
    sem.set_capacity(2).unwrap();
    drop(held);
    assert_eq!(sem.available_permits(), 1);

    // A permit is spare, but the queue is not empty: newcomers still line up.
    assert!(sem.is_locked());
    let mut newcomer = sem.acquire();
    assert!(poll!(&mut newcomer).is_pending());

    // Claiming the earlier grant tops up the newcomer from the spare permit.
    let earlier_permit = expect_permit(poll!(&mut earlier));
    let newcomer_permit = expect_permit(poll!(&mut newcomer));
    assert_eq!(sem.available_permits(), 0);
    drop(earlier_permit);
    drop(newcomer_permit);
}

#[tokio::test(start_paused = true)]
async fn contended_tasks_complete_in_priority_order() {
    let sem = Arc::new(PrioritySemaphore::new(1));
    let order = Arc::new(Mutex::new(Vec::new()));
    let held = sem.acquire().await.unwrap();

    let mut handles = Vec::new();
    for (name, priority) in [("low", -5), ("mid", 0), ("high", 7)] {
        let sem = Arc::clone(&sem);
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_with_priority(priority).await.unwrap();
            order.lock().unwrap().push(name);
        }));
        // Let the task enqueue before the next one starts.
        sleep(Duration::from_millis(1)).await;
    }

    drop(held);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), ["high", "mid", "low"]);
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use paceline::{Debouncer, PrioritySemaphore, ReschedulableTimeout};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("=== Pacing commands through a priority semaphore ===\n");
    paced_commands().await;

    println!("\n=== Idle watchdog with a reschedulable timeout ===\n");
    idle_watchdog().await;

    println!("\n=== Suppressing duplicate events ===\n");
    deduplicated_events();
}

/// Bounds concurrent outstanding commands to 2, letting an urgent request
/// overtake the routine backlog.
async fn paced_commands() {
    let gate = Arc::new(PrioritySemaphore::new(2));

    let mut workers = Vec::new();
    for (name, priority) in [
        ("routine-1", 0),
        ("routine-2", 0),
        ("routine-3", 0),
        ("urgent", 10),
    ] {
        let gate = Arc::clone(&gate);
        workers.push(tokio::spawn(async move {
            let _permit = gate.acquire_with_priority(priority).await.unwrap();
            println!("{name} running (priority {priority})");
            sleep(Duration::from_millis(50)).await;
        }));
        sleep(Duration::from_millis(5)).await;
    }

    for worker in workers {
        worker.await.unwrap();
    }
}

/// Resets an idle timeout on every "activity" burst; it fires once, a
/// second after activity stops.
async fn idle_watchdog() {
    let timeouts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&timeouts);
    let watchdog = ReschedulableTimeout::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        println!("idle timeout fired");
    });

    for burst in 0..5 {
        println!("activity burst {burst}");
        watchdog.reschedule(Duration::from_secs(1));
        sleep(Duration::from_millis(200)).await;
    }

    sleep(Duration::from_millis(1200)).await;
    println!("fired {} time(s)", timeouts.load(Ordering::SeqCst));
}

/// Delivers each distinct event at most once per second.
fn deduplicated_events() {
    let mut seen = Debouncer::new();

    for event in ["join", "join", "leave", "join", "leave"] {
        if seen.filter(event, Duration::from_secs(1)) {
            println!("{event}: suppressed");
        } else {
            println!("{event}: delivered");
        }
    }
}

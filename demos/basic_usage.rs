//! Basic usage example for the step timer engine

use async_trait::async_trait;
use step_timers::{
    format_remaining, split_by_completion, CancellationToken, CompletionNotifier, Duration,
    EngineConfig, TimerEngine, TimerId,
};

/// Stands in for an alert or haptic buzz
struct Bell;

#[async_trait]
impl CompletionNotifier for Bell {
    async fn timer_completed(&self, id: TimerId, name: &str) {
        println!("Ding! Timer {} '{}' is done", id, name);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cancel_token = CancellationToken::new();

    // Speed up time: one tick every 10ms instead of every second
    let config = EngineConfig::default()
        .with_name("example_kitchen")
        .with_tick_period(Duration::from_millis(10));
    let (engine, mut events) = TimerEngine::new(config, cancel_token.clone())?;

    // Forward completions to the bell until cancelled
    let dispatch_token = cancel_token.clone();
    let dispatcher = tokio::spawn(async move { events.dispatch(&Bell, dispatch_token).await });

    // Timers for recipe steps
    let eggs = engine.start_step_timer("Breakfast", "Boil eggs", 1)?;
    let toast = engine.start_step_timer("Breakfast", "Toast bread", 2)?;
    let coffee = engine.create("Brew coffee", 3)?;
    println!("Timers set! Waiting...");

    tokio::time::sleep(Duration::from_millis(300)).await;
    engine.pause(toast)?;
    println!("Paused toast");

    // Unknown or stale ids are safe to ignore
    let _ = engine.start(coffee);
    engine.remove(coffee)?;
    let _ = engine.pause(coffee);

    tokio::time::sleep(Duration::from_millis(500)).await;
    engine.start(toast)?;

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let (unfinished, completed) = split_by_completion(&engine.list());
    for timer in unfinished.iter().chain(completed.iter()) {
        println!(
            "{:<28} {} {:>5.1}% {:?}",
            timer.name,
            format_remaining(timer.remaining as i64)?,
            timer.progress_percent(),
            timer.urgency()
        );
    }
    println!("{} done, eggs done: {}", completed.len(), engine.get(eggs)?.is_completed);

    // Shutdown gracefully
    engine.shutdown().await;
    cancel_token.cancel();
    let delivered = dispatcher.await?;

    println!("Timer engine shut down after {} notification(s)", delivered);
    Ok(())
}

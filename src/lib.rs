//! # Step Timers
//!
//! Concurrent countdown timers for cooking steps, built on top of Tokio.
//!
//! A [`TimerEngine`] owns any number of independent timers. Each running
//! timer gets exactly one tick task that takes a second off its remaining
//! time every tick period; when a timer reaches zero the engine sends a
//! single [`TimerEvent::Completed`] on its event channel.
//!
//! ## Features
//!
//! - **Independent Timers**: Start, pause, reset and remove timers by id
//! - **Synchronous Cancellation**: No tick lands after `pause`, `reset` or `remove` returns
//! - **One-shot Completion Events**: Bounded channel, never blocks the tick path
//! - **Graceful Shutdown**: Cancellation tokens, explicit shutdown, or drop
//! - **Comprehensive Logging**: Lifecycle logged through the `log` facade
//!
//! ## Quick Start
//!
//! ```rust
//! use step_timers::{CancellationToken, EngineConfig, TimerEngine, TimerEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cancel_token = CancellationToken::new();
//!     let config = EngineConfig::default()
//!         .with_name("kitchen")
//!         .with_tick_period(std::time::Duration::from_millis(1));
//!
//!     let (engine, mut events) = TimerEngine::new(config, cancel_token.clone())?;
//!
//!     // One-minute timer, ticking every millisecond for the example
//!     let id = engine.start_step_timer("Pancakes", "Rest batter", 1)?;
//!
//!     if let Some(TimerEvent::Completed { id: done, name }) = events.recv_event().await {
//!         assert_eq!(done, id);
//!         println!("'{}' is done!", name);
//!     }
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod display;
mod engine;
mod error;
mod event;
mod registry;
mod scheduler;
mod timer;

pub use config::EngineConfig;
pub use display::{format_remaining, split_by_completion};
pub use engine::TimerEngine;
pub use error::{Result, TimerError};
pub use event::{CompletionNotifier, TimerEvent, TimerEvents};
pub use timer::{Timer, TimerId, Urgency};

// Re-export commonly used types for convenience
pub use std::time::Duration;
pub use tokio::time::MissedTickBehavior;
pub use tokio_util::sync::CancellationToken;

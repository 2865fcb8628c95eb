use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{Result, TimerError};
use crate::event::{self, TimerEvent, TimerEvents};
use crate::registry::{Registry, TickOutcome};
use crate::scheduler::{self, TickScheduler};
use crate::timer::{Timer, TimerId};

/// Countdown timer engine.
///
/// Owns every timer record and one tick task per running timer. All
/// operations are synchronous: they update state, (de)register the tick task
/// and return without waiting for a tick. Once `pause`, `reset` or `remove`
/// returns, no tick from an earlier run can change the timer again.
///
/// Dropping the engine releases every tick task.
pub struct TimerEngine {
    shared: Arc<Shared>,

    /// Cancels the engine's tick tasks; child of the caller's token
    root_token: CancellationToken,
}

struct Shared {
    /// Instance name for logging
    name: String,

    config: EngineConfig,

    /// Timer records and tick sources, always locked together
    state: Mutex<EngineState>,

    event_tx: mpsc::Sender<TimerEvent>,

    runtime: Handle,
}

struct EngineState {
    registry: Registry,
    scheduler: TickScheduler,
    shut_down: bool,
}

impl TimerEngine {
    /// Create an engine on the current Tokio runtime.
    ///
    /// Cancelling `cancel_token` shuts the engine down just like
    /// [`TimerEngine::shutdown`]. Returns the engine and the receiver for
    /// its completion events.
    pub fn new(
        config: EngineConfig,
        cancel_token: CancellationToken,
    ) -> Result<(Self, TimerEvents)> {
        config.validate()?;
        let runtime = Handle::try_current()?;
        let (event_tx, events) = event::channel(config.event_buffer_size);
        let root_token = cancel_token.child_token();

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            state: Mutex::new(EngineState {
                registry: Registry::new(),
                scheduler: TickScheduler::new(root_token.clone()),
                shut_down: false,
            }),
            config,
            event_tx,
            runtime: runtime.clone(),
        });

        let weak = Arc::downgrade(&shared);
        let watch_token = root_token.clone();
        runtime.spawn(async move {
            watch_token.cancelled().await;
            if let Some(shared) = weak.upgrade() {
                shared.teardown();
            }
        });

        log::info!("Timer engine '{}' started", shared.name);

        Ok((TimerEngine { shared, root_token }, events))
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Add a stopped timer lasting `duration_minutes`
    pub fn create(&self, name: impl Into<String>, duration_minutes: i64) -> Result<TimerId> {
        let name = name.into();
        let mut state = self.shared.state.lock();
        let id = state
            .registry
            .create(name.clone(), duration_minutes)
            .inspect_err(|e| {
                log::warn!("Rejected timer '{}' in '{}': {}", name, self.shared.name, e)
            })?;

        log::info!(
            "Created timer '{}' ({}) for {} minute(s) in '{}'",
            name,
            id,
            duration_minutes,
            self.shared.name
        );
        Ok(id)
    }

    /// Create a timer for a recipe step and start it right away
    pub fn start_step_timer(
        &self,
        recipe_title: &str,
        step_label: &str,
        duration_minutes: i64,
    ) -> Result<TimerId> {
        let id = self.create(format!("{recipe_title} - {step_label}"), duration_minutes)?;
        self.start(id)?;
        Ok(id)
    }

    /// Start or resume a timer. Running and completed timers are left as is,
    /// even after shutdown; any other timer fails with
    /// [`TimerError::Shutdown`] once the engine is shut down.
    pub fn start(&self, id: TimerId) -> Result<()> {
        let mut state = self.shared.state.lock();
        let timer = state
            .registry
            .get(id)
            .map_err(|e| self.shared.rejected("start", e))?;
        if timer.is_active || timer.is_completed {
            log::debug!("Timer {} already running or completed in '{}'", id, self.shared.name);
            return Ok(());
        }
        if state.shut_down {
            return Err(TimerError::Shutdown);
        }
        state.registry.activate(id)?;

        let period = self.shared.config.tick_period;
        let behavior = self.shared.config.missed_tick_behavior;
        let weak = Arc::downgrade(&self.shared);
        let runtime = &self.shared.runtime;
        let run = state.scheduler.begin(id, |run, token| {
            runtime.spawn(scheduler::drive(
                move || Shared::tick_weak(&weak, id, run),
                period,
                behavior,
                token,
            ))
        });

        log::debug!("Started timer {} (run {}) in '{}'", id, run, self.shared.name);
        Ok(())
    }

    /// Stop a timer, keeping its remaining time
    pub fn pause(&self, id: TimerId) -> Result<()> {
        let mut state = self.shared.state.lock();
        let was_active = state
            .registry
            .deactivate(id)
            .map_err(|e| self.shared.rejected("pause", e))?;
        state.scheduler.stop(id);

        if was_active {
            log::debug!("Paused timer {} in '{}'", id, self.shared.name);
        }
        Ok(())
    }

    /// Stop a timer and restore its full duration, clearing completion
    pub fn reset(&self, id: TimerId) -> Result<()> {
        let mut state = self.shared.state.lock();
        state
            .registry
            .rewind(id)
            .map_err(|e| self.shared.rejected("reset", e))?;
        state.scheduler.stop(id);

        log::debug!("Reset timer {} in '{}'", id, self.shared.name);
        Ok(())
    }

    /// Stop a timer and forget it
    pub fn remove(&self, id: TimerId) -> Result<()> {
        let mut state = self.shared.state.lock();
        let timer = state
            .registry
            .remove(id)
            .map_err(|e| self.shared.rejected("remove", e))?;
        state.scheduler.stop(id);

        log::debug!("Removed timer '{}' ({}) from '{}'", timer.name, id, self.shared.name);
        Ok(())
    }

    pub fn get(&self, id: TimerId) -> Result<Timer> {
        self.shared.state.lock().registry.get(id).cloned()
    }

    /// Snapshot of all timers in creation order
    pub fn list(&self) -> Vec<Timer> {
        self.shared.state.lock().registry.list()
    }

    /// Number of tick tasks currently registered
    pub fn tick_sources(&self) -> usize {
        self.shared.state.lock().scheduler.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().shut_down
    }

    /// Stop every running timer and wait for their tick tasks to finish.
    ///
    /// Timer records stay readable; starting a timer afterwards fails with
    /// [`TimerError::Shutdown`].
    pub async fn shutdown(&self) {
        let handles = self.shared.teardown();
        self.root_token.cancel();

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    log::warn!("Tick task in '{}' failed: {}", self.shared.name, e);
                }
            }
        }
        log::info!("Timer engine '{}' stopped", self.shared.name);
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.shared.teardown();
        self.root_token.cancel();
    }
}

impl Shared {
    fn tick_weak(shared: &Weak<Shared>, id: TimerId, run: u64) -> ControlFlow<()> {
        match shared.upgrade() {
            Some(shared) => shared.tick(id, run),
            None => ControlFlow::Break(()),
        }
    }

    /// Apply one tick from tick source `run` of timer `id`
    fn tick(&self, id: TimerId, run: u64) -> ControlFlow<()> {
        let completed = {
            let mut state = self.state.lock();
            if !state.scheduler.is_current(id, run) {
                return ControlFlow::Break(());
            }
            match state.registry.tick(id) {
                TickOutcome::Stale => {
                    state.scheduler.stop(id);
                    return ControlFlow::Break(());
                }
                TickOutcome::Counting(remaining) => {
                    log::trace!("Timer {} has {}s left in '{}'", id, remaining, self.name);
                    return ControlFlow::Continue(());
                }
                TickOutcome::Completed(timer) => {
                    state.scheduler.stop(id);
                    timer
                }
            }
        };

        log::info!("Timer '{}' ({}) completed in '{}'", completed.name, id, self.name);
        event::emit(
            &self.event_tx,
            &self.name,
            TimerEvent::Completed {
                id,
                name: completed.name,
            },
        );
        ControlFlow::Break(())
    }

    /// Release all tick sources and mark every timer stopped
    fn teardown(&self) -> Vec<JoinHandle<()>> {
        let mut state = self.state.lock();
        if state.shut_down {
            return Vec::new();
        }
        state.shut_down = true;

        let stopped = state.registry.deactivate_all();
        let handles = state.scheduler.drain();
        log::info!(
            "Timer engine '{}' shutting down, stopped {} running timer(s) of {}",
            self.name,
            stopped,
            state.registry.len()
        );
        handles
    }

    fn rejected(&self, operation: &str, error: TimerError) -> TimerError {
        log::debug!("Ignoring {} in '{}': {}", operation, self.name, error);
        error
    }
}

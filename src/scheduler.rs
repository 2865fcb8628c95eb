use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::timer::TimerId;

/// Handle to the task producing ticks for one timer.
///
/// Dropping the handle cancels its token and aborts the task.
#[derive(Debug)]
pub(crate) struct TickSource {
    run: u64,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Cancel the task and hand back its join handle
    fn into_handle(mut self) -> Option<JoinHandle<()>> {
        self.token.cancel();
        let handle = self.handle.take();
        if let Some(handle) = &handle {
            handle.abort();
        }
        handle
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Running tick sources keyed by timer id, at most one per id.
///
/// Each source gets a run number that is never reused, so a tick can check
/// it still belongs to the live source before touching timer state.
#[derive(Debug)]
pub(crate) struct TickScheduler {
    sources: HashMap<TimerId, TickSource>,
    last_run: u64,
    root_token: CancellationToken,
}

impl TickScheduler {
    pub(crate) fn new(root_token: CancellationToken) -> Self {
        TickScheduler {
            sources: HashMap::new(),
            last_run: 0,
            root_token,
        }
    }

    /// Start a tick source for `id`, replacing any existing one.
    ///
    /// `spawn` receives the run number and the source's cancellation token.
    pub(crate) fn begin<F>(&mut self, id: TimerId, spawn: F) -> u64
    where
        F: FnOnce(u64, CancellationToken) -> JoinHandle<()>,
    {
        self.stop(id);

        self.last_run += 1;
        let run = self.last_run;
        let token = self.root_token.child_token();
        let handle = spawn(run, token.clone());
        self.sources.insert(
            id,
            TickSource {
                run,
                token,
                handle: Some(handle),
            },
        );
        run
    }

    /// Release the tick source for `id`. Returns false if none was running.
    pub(crate) fn stop(&mut self, id: TimerId) -> bool {
        self.sources.remove(&id).is_some()
    }

    pub(crate) fn is_current(&self, id: TimerId, run: u64) -> bool {
        self.sources.get(&id).is_some_and(|s| s.run == run)
    }

    pub(crate) fn len(&self) -> usize {
        self.sources.len()
    }

    /// Release every source, returning the aborted tasks' handles
    pub(crate) fn drain(&mut self) -> Vec<JoinHandle<()>> {
        self.sources
            .drain()
            .filter_map(|(_, source)| source.into_handle())
            .collect()
    }
}

/// Call `on_tick` once per `period`, starting one period from now, until it
/// breaks or the token is cancelled.
///
/// Deadlines are anchored to the start instant, so a slow tick does not push
/// later ones back.
pub(crate) async fn drive<F>(
    mut on_tick: F,
    period: Duration,
    missed_tick_behavior: MissedTickBehavior,
    token: CancellationToken,
) where
    F: FnMut() -> ControlFlow<()>,
{
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(missed_tick_behavior);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = ticks.tick() => {
                if on_tick().is_break() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    const SECOND: Duration = Duration::from_secs(1);

    fn counting(counter: Arc<AtomicU32>, limit: u32) -> impl FnMut() -> ControlFlow<()> {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_ticks_once_per_period() {
        let counter = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        tokio::spawn(drive(
            counting(counter.clone(), u32::MAX),
            SECOND,
            MissedTickBehavior::Burst,
            token.clone(),
        ));

        sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        token.cancel();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_stops_on_break() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = tokio::spawn(drive(
            counting(counter.clone(), 2),
            SECOND,
            MissedTickBehavior::Burst,
            CancellationToken::new(),
        ));

        sleep(Duration::from_millis(10_500)).await;
        assert!(task.is_finished());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    fn idle_task(token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { token.cancelled().await })
    }

    #[tokio::test]
    async fn test_begin_replaces_existing_source() {
        let mut scheduler = TickScheduler::new(CancellationToken::new());
        let id = TimerId::new(1);

        let mut first_token = None;
        let first = scheduler.begin(id, |_, token| {
            first_token = Some(token.clone());
            idle_task(token)
        });
        let second = scheduler.begin(id, |_, token| idle_task(token));

        assert_ne!(first, second);
        assert_eq!(scheduler.len(), 1);
        assert!(first_token.unwrap().is_cancelled());
        assert!(!scheduler.is_current(id, first));
        assert!(scheduler.is_current(id, second));
    }

    #[tokio::test]
    async fn test_stop_cancels_source() {
        let mut scheduler = TickScheduler::new(CancellationToken::new());
        let id = TimerId::new(3);
        let mut captured = None;
        let run = scheduler.begin(id, |_, token| {
            captured = Some(token.clone());
            idle_task(token)
        });

        assert!(scheduler.stop(id));
        assert!(!scheduler.stop(id));
        assert!(!scheduler.is_current(id, run));
        assert!(captured.unwrap().is_cancelled());
        assert_eq!(scheduler.len(), 0);
    }

    #[tokio::test]
    async fn test_drain_releases_everything() {
        let root = CancellationToken::new();
        let mut scheduler = TickScheduler::new(root.clone());
        for raw in 1..=3 {
            scheduler.begin(TimerId::new(raw), |_, token| idle_task(token));
        }

        let handles = scheduler.drain();
        assert_eq!(handles.len(), 3);
        assert_eq!(scheduler.len(), 0);
        for handle in handles {
            let result = handle.await;
            assert!(result.is_ok() || result.unwrap_err().is_cancelled());
        }
        assert!(!root.is_cancelled());
    }

    #[tokio::test]
    async fn test_root_token_cancels_children() {
        let root = CancellationToken::new();
        let mut scheduler = TickScheduler::new(root.clone());
        let mut captured = None;
        scheduler.begin(TimerId::new(9), |_, token| {
            captured = Some(token.clone());
            idle_task(token)
        });

        root.cancel();
        assert!(captured.unwrap().is_cancelled());
    }
}

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::timer::TimerId;

/// Timer event enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A timer counted down to zero. Sent once per run.
    Completed { id: TimerId, name: String },
}

/// Receiver side of the engine's completion events
pub struct TimerEvents {
    event_rx: mpsc::Receiver<TimerEvent>,
}

/// Side effect to run when a timer completes (alert, haptic, toast...)
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn timer_completed(&self, id: TimerId, name: &str);
}

pub(crate) fn channel(buffer_size: usize) -> (mpsc::Sender<TimerEvent>, TimerEvents) {
    let (event_tx, event_rx) = mpsc::channel(buffer_size.max(1));
    (event_tx, TimerEvents { event_rx })
}

/// Send an event without waiting. A full or closed channel drops the event.
pub(crate) fn emit(event_tx: &mpsc::Sender<TimerEvent>, engine: &str, event: TimerEvent) {
    if let Err(e) = event_tx.try_send(event) {
        match e {
            mpsc::error::TrySendError::Full(TimerEvent::Completed { name, .. }) => {
                log::warn!(
                    "Event channel full in '{}', dropping completion of '{}'",
                    engine,
                    name
                );
            }
            mpsc::error::TrySendError::Closed(TimerEvent::Completed { name, .. }) => {
                log::warn!(
                    "Event channel closed in '{}', cannot send completion of '{}'",
                    engine,
                    name
                );
            }
        }
    }
}

impl TimerEvents {
    /// Receive the next timer event (blocking)
    pub async fn recv_event(&mut self) -> Option<TimerEvent> {
        self.event_rx.recv().await
    }

    /// Try to receive a timer event (non-blocking)
    pub fn try_recv_event(&mut self) -> Result<TimerEvent, mpsc::error::TryRecvError> {
        self.event_rx.try_recv()
    }

    /// Forward events to `notifier` until the token is cancelled or the
    /// engine is dropped. Returns the number of events delivered.
    pub async fn dispatch<N>(&mut self, notifier: &N, cancel_token: CancellationToken) -> usize
    where
        N: CompletionNotifier + ?Sized,
    {
        let mut delivered = 0;
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                event = self.event_rx.recv() => match event {
                    Some(TimerEvent::Completed { id, name }) => {
                        notifier.timer_completed(id, &name).await;
                        delivered += 1;
                    }
                    None => break,
                },
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(TimerId, String)>>,
    }

    #[async_trait]
    impl CompletionNotifier for Recorder {
        async fn timer_completed(&self, id: TimerId, name: &str) {
            self.seen.lock().push((id, name.to_string()));
        }
    }

    fn completed(raw: u64, name: &str) -> TimerEvent {
        TimerEvent::Completed {
            id: TimerId::new(raw),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_emit_and_receive() {
        let (tx, mut events) = channel(4);
        emit(&tx, "test", completed(1, "Boil eggs"));
        assert_eq!(events.recv_event().await, Some(completed(1, "Boil eggs")));
        assert!(events.try_recv_event().is_err());
    }

    #[tokio::test]
    async fn test_emit_drops_when_full() {
        let (tx, mut events) = channel(1);
        emit(&tx, "test", completed(1, "first"));
        emit(&tx, "test", completed(2, "second"));
        assert_eq!(events.try_recv_event().unwrap(), completed(1, "first"));
        assert!(events.try_recv_event().is_err());
    }

    #[tokio::test]
    async fn test_emit_to_closed_channel_does_not_panic() {
        let (tx, events) = channel(1);
        drop(events);
        emit(&tx, "test", completed(1, "orphan"));
    }

    #[tokio::test]
    async fn test_dispatch_until_senders_dropped() {
        let (tx, mut events) = channel(4);
        emit(&tx, "test", completed(1, "Rice"));
        emit(&tx, "test", completed(2, "Beans"));
        drop(tx);

        let recorder = Recorder::default();
        let delivered = events.dispatch(&recorder, CancellationToken::new()).await;
        assert_eq!(delivered, 2);
        assert_eq!(
            *recorder.seen.lock(),
            vec![
                (TimerId::new(1), "Rice".to_string()),
                (TimerId::new(2), "Beans".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_stops_on_cancel() {
        let (_tx, mut events) = channel(4);
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();

        let recorder = Recorder::default();
        assert_eq!(events.dispatch(&recorder, cancel_token).await, 0);
        assert!(recorder.seen.lock().is_empty());
    }
}

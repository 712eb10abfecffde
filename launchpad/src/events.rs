//! Loader events
//!
//! A load attempt publishes zero or more `progress` events followed by
//! exactly one terminal event (`loaded` or `error`). Publication goes through
//! an [`EventBus`] that refuses anything after the terminal event.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum LoaderEvent {
    Progress {
        #[serde(rename = "queueIndex")]
        queue_index: usize,
        #[serde(rename = "queueSize")]
        queue_size: usize,
    },
    Loaded,
    Error {
        message: String,
    },
}

impl LoaderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Progress { .. } => EventKind::Progress,
            Self::Loaded => EventKind::Loaded,
            Self::Error { .. } => EventKind::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Progress,
    Loaded,
    Error,
}

/// Terminal state of a load attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Error(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    pub fn to_event(&self) -> LoaderEvent {
        match self {
            Self::Loaded => LoaderEvent::Loaded,
            Self::Error(message) => LoaderEvent::Error {
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Default)]
struct BusState {
    finished: bool,
    subscribers: Vec<mpsc::UnboundedSender<LoaderEvent>>,
}

impl BusState {
    /// Deliver to every live subscriber, forgetting the dropped ones
    fn publish(&mut self, event: &LoaderEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Fan-out of one load attempt's events.
///
/// Every subscriber owns an unbounded queue, so a slow reader never loses
/// progress events.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    // sends happen under this lock so subscribe/finish are ordered with them
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event kind
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_filtered(None)
    }

    /// Subscribe to the listed event kinds only
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> Subscription {
        self.subscribe_filtered(Some(kinds.to_vec()))
    }

    fn subscribe_filtered(&self, kinds: Option<Vec<EventKind>>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // a late subscriber gets a closed queue and ends at once
        if !state.finished {
            state.subscribers.push(tx);
        }
        Subscription { rx, kinds }
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    pub fn progress_sink(&self) -> ProgressSink {
        ProgressSink { bus: self.clone() }
    }

    fn progress(&self, queue_index: usize, queue_size: usize) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.publish(&LoaderEvent::Progress {
            queue_index,
            queue_size,
        });
    }

    /// Publish the terminal event. Returns false if one was already sent.
    pub(crate) fn finish(&self, outcome: &LoadOutcome) -> bool {
        let mut state = self.lock();
        if state.finished {
            return false;
        }
        state.finished = true;
        state.publish(&outcome.to_event());
        // closing the queues lets subscribers drain and then stop
        state.subscribers.clear();
        true
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Progress callback handed to asset drivers.
///
/// Reports are re-emitted verbatim as `progress` events. Once the load has
/// finished the sink goes quiet.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    bus: EventBus,
}

impl ProgressSink {
    pub fn report(&self, queue_index: usize, queue_size: usize) {
        self.bus.progress(queue_index, queue_size);
    }
}

/// Receiving side of an [`EventBus`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<LoaderEvent>,
    kinds: Option<Vec<EventKind>>,
}

impl Subscription {
    /// Narrow this subscription to the listed event kinds
    pub fn only(mut self, kinds: &[EventKind]) -> Self {
        self.kinds = Some(kinds.to_vec());
        self
    }

    /// Next matching event, or `None` once the terminal event has passed
    pub async fn recv(&mut self) -> Option<LoaderEvent> {
        while let Some(event) = self.rx.recv().await {
            let terminal = event.is_terminal();
            if terminal {
                self.rx.close();
            }
            if self.wants(event.kind()) {
                return Some(event);
            }
            if terminal {
                break;
            }
        }
        None
    }

    /// Drain events until the terminal one
    pub async fn collect(mut self) -> Vec<LoaderEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            events.push(event);
        }
        events
    }

    fn wants(&self, kind: EventKind) -> bool {
        self.kinds
            .as_ref()
            .map(|kinds| kinds.contains(&kind))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_then_terminal() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let sink = bus.progress_sink();

        sink.report(1, 2);
        sink.report(2, 2);
        assert!(bus.finish(&LoadOutcome::Loaded));

        let events = sub.collect().await;
        assert_eq!(
            events,
            vec![
                LoaderEvent::Progress { queue_index: 1, queue_size: 2 },
                LoaderEvent::Progress { queue_index: 2, queue_size: 2 },
                LoaderEvent::Loaded,
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_after_terminal() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let sink = bus.progress_sink();

        assert!(bus.finish(&LoadOutcome::Error("boom".into())));
        sink.report(1, 1);
        assert!(!bus.finish(&LoadOutcome::Loaded));

        let events = sub.collect().await;
        assert_eq!(
            events,
            vec![LoaderEvent::Error { message: "boom".into() }]
        );
    }

    #[tokio::test]
    async fn test_filtered_subscription() {
        let bus = EventBus::new();
        let sub = bus.subscribe_to(&[EventKind::Loaded, EventKind::Error]);
        let sink = bus.progress_sink();

        sink.report(1, 1);
        bus.finish(&LoadOutcome::Loaded);

        assert_eq!(sub.collect().await, vec![LoaderEvent::Loaded]);
    }

    #[tokio::test]
    async fn test_late_subscription_ends_immediately() {
        let bus = EventBus::new();
        bus.finish(&LoadOutcome::Loaded);
        let mut sub = bus.subscribe();
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_slow_subscriber_sees_every_progress_event() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let sink = bus.progress_sink();

        for i in 1..=5000 {
            sink.report(i, 5000);
        }
        bus.finish(&LoadOutcome::Loaded);

        let events = sub.collect().await;
        assert_eq!(events.len(), 5001);
        assert_eq!(events[0], LoaderEvent::Progress { queue_index: 1, queue_size: 5000 });
        assert_eq!(events[4999], LoaderEvent::Progress { queue_index: 5000, queue_size: 5000 });
        assert_eq!(events[5000], LoaderEvent::Loaded);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_forgotten() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.progress_sink().report(1, 1);
        assert_eq!(bus.lock().subscribers.len(), 1);
        bus.finish(&LoadOutcome::Loaded);
        assert_eq!(kept.collect().await.len(), 2);
    }

    #[test]
    fn test_event_json_shape() {
        let event = LoaderEvent::Progress { queue_index: 3, queue_size: 7 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"event": "progress", "queueIndex": 3, "queueSize": 7}));

        let json = serde_json::to_value(LoaderEvent::Error { message: "x".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"event": "error", "message": "x"}));
    }
}

use async_trait::async_trait;
use futures::StreamExt;
use leadflow_core::{ActivityEvent, ActivityStream, EventSource, GatewayError, SessionId};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 256;

/// In-process [`EventSource`] backed by a tokio broadcast channel.
///
/// Publishers push events for any session; each subscription only sees events
/// for the session it was opened with, starting from the moment it subscribed.
#[derive(Clone)]
pub struct BroadcastEventSource {
    tx: broadcast::Sender<ActivityEvent>,
}

impl Default for BroadcastEventSource {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastEventSource {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Returns the number of subscriptions that saw it.
    pub fn publish(&self, event: ActivityEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl EventSource for BroadcastEventSource {
    async fn subscribe(&self, session_id: &SessionId) -> Result<ActivityStream, GatewayError> {
        let rx = self.tx.subscribe();
        let session_id = session_id.clone();
        debug!(session_id = %session_id, "broadcast feed opened");

        let events = BroadcastStream::new(rx).filter_map(move |item| {
            let session_id = session_id.clone();
            async move {
                match item {
                    Ok(event) if event.session_id == session_id => Some(event),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(n)) => {
                        warn!(session_id = %session_id, skipped = n, "activity feed lagged, dropped events");
                        None
                    }
                }
            }
        });
        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::ActivityKind;

    fn event(session: &str, message: &str) -> ActivityEvent {
        ActivityEvent::new(SessionId::from_raw(session), ActivityKind::Progress, message)
    }

    #[tokio::test]
    async fn subscription_sees_only_its_session() {
        let source = BroadcastEventSource::default();
        let mut feed = source.subscribe(&SessionId::from_raw("a")).await.unwrap();

        let _ = source.publish(event("b", "not mine"));
        let _ = source.publish(event("a", "mine"));

        let evt = feed.next().await.unwrap();
        assert_eq!(evt.message, "mine");
    }

    #[tokio::test]
    async fn events_before_subscribe_are_not_replayed() {
        let source = BroadcastEventSource::default();
        assert_eq!(source.publish(event("a", "early")), 0);

        let mut feed = source.subscribe(&SessionId::from_raw("a")).await.unwrap();
        let _ = source.publish(event("a", "late"));
        assert_eq!(feed.next().await.unwrap().message, "late");
    }

    #[tokio::test]
    async fn feed_ends_when_source_dropped() {
        let source = BroadcastEventSource::default();
        let mut feed = source.subscribe(&SessionId::from_raw("a")).await.unwrap();
        assert_eq!(source.subscriber_count(), 1);
        drop(source);
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn lagged_subscription_keeps_going() {
        let source = BroadcastEventSource::new(2);
        let mut feed = source.subscribe(&SessionId::from_raw("a")).await.unwrap();
        for i in 0..5 {
            let _ = source.publish(event("a", &format!("e{i}")));
        }
        // Oldest events were overwritten; the newest survive.
        let evt = feed.next().await.unwrap();
        assert_eq!(evt.message, "e3");
        assert_eq!(feed.next().await.unwrap().message, "e4");
    }
}

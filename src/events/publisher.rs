use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::service::JobKind;

/// Fan-out publisher for job lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// Event that has been published
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub name: String,
    pub run_id: Uuid,
    pub kind: JobKind,
    pub job_id: Option<String>,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event.
    ///
    /// Never blocks; events published while nobody is subscribed are dropped.
    pub fn publish(
        &self,
        name: impl Into<String>,
        run_id: Uuid,
        kind: JobKind,
        job_id: Option<&str>,
        context: Value,
    ) {
        let event = LifecycleEvent {
            name: name.into(),
            run_id,
            kind,
            job_id: job_id.map(str::to_string),
            context,
            published_at: chrono::Utc::now(),
        };

        // send() only fails when there are no receivers
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

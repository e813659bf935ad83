//! Builders shared by the orchestrator integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use recipe_jobs::config::{Preset, RuntimeSettings};
use recipe_jobs::events::{EventPublisher, LifecycleEvent};
use recipe_jobs::orchestration::JobOrchestrator;
use recipe_jobs::progress::ProgressSnapshot;
use recipe_jobs::test_helpers::ScriptedJobService;
use tokio::sync::broadcast;

/// Orchestrator wired to a scripted service, with a subscribed event stream
pub struct Harness {
    pub service: Arc<ScriptedJobService>,
    pub orchestrator: JobOrchestrator,
    pub events: broadcast::Receiver<LifecycleEvent>,
}

impl Harness {
    pub fn new(service: ScriptedJobService, preset: Preset) -> Self {
        let service = Arc::new(service);
        let publisher = EventPublisher::new(1024);
        let events = publisher.subscribe();
        let orchestrator = JobOrchestrator::new(
            service.clone(),
            preset,
            &RuntimeSettings::default(),
            publisher,
        );
        Self {
            service,
            orchestrator,
            events,
        }
    }

    /// Names of every event published so far
    pub fn drain_event_names(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            names.push(event.name);
        }
        names
    }
}

/// Let the paused clock run forward
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Distinct attempt numbers in the order they were first reported
pub fn attempt_sequence(snapshots: &[ProgressSnapshot]) -> Vec<u32> {
    let mut attempts: Vec<u32> = snapshots.iter().map(|s| s.attempt_number).collect();
    attempts.dedup();
    attempts
}

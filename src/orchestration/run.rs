use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::constants::messages;
use crate::error::ErrorInfo;
use crate::progress::ProgressSnapshot;
use crate::service::JobResult;

/// Caller's handle on one started run.
///
/// Progress snapshots arrive in order on [`next_snapshot`](Self::next_snapshot);
/// the stream ends when the run resolves. [`wait`](Self::wait) yields exactly
/// one outcome.
#[derive(Debug)]
pub struct JobRun {
    run_id: Uuid,
    snapshots: mpsc::UnboundedReceiver<ProgressSnapshot>,
    outcome: oneshot::Receiver<Result<JobResult, ErrorInfo>>,
}

impl JobRun {
    pub(crate) fn new(
        run_id: Uuid,
        snapshots: mpsc::UnboundedReceiver<ProgressSnapshot>,
        outcome: oneshot::Receiver<Result<JobResult, ErrorInfo>>,
    ) -> Self {
        Self {
            run_id,
            snapshots,
            outcome,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next progress snapshot, or `None` once the run has resolved
    pub async fn next_snapshot(&mut self) -> Option<ProgressSnapshot> {
        self.snapshots.recv().await
    }

    /// Snapshot already delivered, without waiting
    pub fn try_next_snapshot(&mut self) -> Option<ProgressSnapshot> {
        self.snapshots.try_recv().ok()
    }

    /// Wait for the run to resolve
    pub async fn wait(self) -> Result<JobResult, ErrorInfo> {
        match self.outcome.await {
            Ok(outcome) => outcome,
            // The orchestrator went away without resolving
            Err(_) => Err(ErrorInfo::cancelled(messages::RUN_TORN_DOWN)),
        }
    }

    /// Drain every snapshot, then return them along with the outcome
    pub async fn collect(mut self) -> (Vec<ProgressSnapshot>, Result<JobResult, ErrorInfo>) {
        let mut snapshots = Vec::new();
        while let Some(snapshot) = self.snapshots.recv().await {
            snapshots.push(snapshot);
        }
        let outcome = self.wait().await;
        (snapshots, outcome)
    }
}

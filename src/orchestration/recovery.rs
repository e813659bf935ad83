//! Error presentation and recovery
//!
//! Failed runs surface here as a [`RecoveryNotice`]. Network and job failures
//! stay up until the caller starts a new run; validation notices clear
//! themselves after the display window. Nothing here retries on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::constants::messages;
use crate::error::{ErrorInfo, ErrorKind};

/// What the UI should show for a failed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryNotice {
    pub error: ErrorInfo,
    /// Text shown next to the retry affordance
    pub text: String,
    /// Label of the retry action, when a retry makes sense
    pub action_label: Option<String>,
    pub auto_clears: bool,
}

impl RecoveryNotice {
    pub fn for_error(error: ErrorInfo) -> Self {
        let retryable = error.kind.is_retryable();
        Self {
            text: error.message.clone(),
            action_label: retryable.then(|| messages::RETRY_ACTION.to_string()),
            auto_clears: error.kind == ErrorKind::Validation,
            error,
        }
    }
}

#[derive(Debug)]
struct RecoveryInner {
    display_window: Duration,
    notice: watch::Sender<Option<RecoveryNotice>>,
    generation: AtomicU64,
}

impl RecoveryInner {
    fn clear_if(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.notice.send_replace(None);
            debug!(generation, "Validation notice cleared");
        }
    }
}

/// Holds the notice for the most recent failure
#[derive(Debug, Clone)]
pub struct ErrorRecoveryController {
    inner: Arc<RecoveryInner>,
}

impl ErrorRecoveryController {
    pub fn new(display_window: Duration) -> Self {
        let (notice, _) = watch::channel(None);
        Self {
            inner: Arc::new(RecoveryInner {
                display_window,
                notice,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Show `error`. Cancellations are not presented.
    ///
    /// Must be called from within a Tokio runtime when `error` is a
    /// validation error, since the auto-clear runs as a task.
    pub fn present(&self, error: ErrorInfo) {
        if error.kind == ErrorKind::Cancelled {
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let notice = RecoveryNotice::for_error(error);
        let auto_clears = notice.auto_clears;
        self.inner.notice.send_replace(Some(notice));

        if auto_clears {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.display_window).await;
                inner.clear_if(generation);
            });
        }
    }

    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.notice.send_replace(None);
    }

    pub fn notice(&self) -> Option<RecoveryNotice> {
        self.inner.notice.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RecoveryNotice>> {
        self.inner.notice.subscribe()
    }
}

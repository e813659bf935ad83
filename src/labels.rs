//! Rotating status label shown while a job is being polled

use std::sync::Arc;

/// Cycles through a fixed pool of display strings.
///
/// The cycler is driven externally by label ticks. Once [`stop`](Self::stop)
/// or [`finish`](Self::finish) has been called, [`advance`](Self::advance)
/// refuses to rotate until the next [`start`](Self::start), so a late tick can
/// never overwrite a terminal label.
#[derive(Debug, Clone)]
pub struct LabelCycler {
    pool: Arc<[String]>,
    index: usize,
    active: bool,
    current: String,
}

impl LabelCycler {
    pub fn new(pool: impl IntoIterator<Item = String>) -> Self {
        let pool: Arc<[String]> = pool.into_iter().collect();
        let current = pool.first().cloned().unwrap_or_default();
        Self {
            pool,
            index: 0,
            active: false,
            current,
        }
    }

    /// Begin rotating from the first label
    pub fn start(&mut self) -> &str {
        self.index = 0;
        self.active = !self.pool.is_empty();
        self.current = self.pool.first().cloned().unwrap_or_default();
        &self.current
    }

    /// Rotate to the next label, or `None` when stopped
    pub fn advance(&mut self) -> Option<&str> {
        if !self.active || self.pool.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.pool.len();
        self.current = self.pool[self.index].clone();
        Some(&self.current)
    }

    /// Stop rotating and show the first label again
    pub fn reset(&mut self) -> &str {
        self.index = 0;
        self.active = false;
        self.current = self.pool.first().cloned().unwrap_or_default();
        &self.current
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Stop rotating and pin a terminal label
    pub fn finish(&mut self, label: impl Into<String>) -> &str {
        self.active = false;
        self.current = label.into();
        &self.current
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

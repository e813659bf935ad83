//! # Screen Coordinator
//!
//! A generation screen hosts two independent orchestrators, one per preset,
//! and shows one of them at a time. Switching modes tears down the
//! orchestrator being left so its timers never outlive its visibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use super::orchestrator::JobOrchestrator;
use super::run::JobRun;
use crate::config::{Preset, RuntimeSettings};
use crate::error::ErrorInfo;
use crate::events::EventPublisher;
use crate::service::{JobRequest, JobService};

/// Which orchestrator the screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScreenMode {
    #[default]
    Recipe,
    Ideas,
}

impl ScreenMode {
    pub fn preset(&self) -> Preset {
        match self {
            Self::Recipe => Preset::Generation,
            Self::Ideas => Preset::Ideation,
        }
    }

    fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Generation => Self::Recipe,
            Preset::Ideation => Self::Ideas,
        }
    }
}

impl fmt::Display for ScreenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe => write!(f, "recipe"),
            Self::Ideas => write!(f, "ideas"),
        }
    }
}

/// Owns the Generation and Ideation orchestrators of one screen
#[derive(Debug)]
pub struct ScreenCoordinator {
    generation: JobOrchestrator,
    ideation: JobOrchestrator,
    mode: ScreenMode,
}

impl ScreenCoordinator {
    pub fn new(
        service: Arc<dyn JobService>,
        settings: &RuntimeSettings,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            generation: JobOrchestrator::new(
                Arc::clone(&service),
                Preset::Generation,
                settings,
                publisher.clone(),
            ),
            ideation: JobOrchestrator::new(service, Preset::Ideation, settings, publisher),
            mode: ScreenMode::default(),
        }
    }

    pub fn mode(&self) -> ScreenMode {
        self.mode
    }

    /// Show `mode`, tearing down the orchestrator that was showing
    pub fn switch_mode(&mut self, mode: ScreenMode) {
        if mode == self.mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "Switching screen mode");
        self.orchestrator_mut(self.mode.preset()).teardown();
        self.mode = mode;
    }

    /// Start `request` on the orchestrator for its kind, switching to it first
    pub fn start(&mut self, request: JobRequest) -> Result<JobRun, ErrorInfo> {
        let preset = request.kind.preset();
        self.switch_mode(ScreenMode::for_preset(preset));
        self.orchestrator_mut(preset).start(request)
    }

    /// The orchestrator for the current mode
    pub fn active(&self) -> &JobOrchestrator {
        self.orchestrator(self.mode.preset())
    }

    pub fn active_mut(&mut self) -> &mut JobOrchestrator {
        self.orchestrator_mut(self.mode.preset())
    }

    pub fn orchestrator(&self, preset: Preset) -> &JobOrchestrator {
        match preset {
            Preset::Generation => &self.generation,
            Preset::Ideation => &self.ideation,
        }
    }

    fn orchestrator_mut(&mut self, preset: Preset) -> &mut JobOrchestrator {
        match preset {
            Preset::Generation => &mut self.generation,
            Preset::Ideation => &mut self.ideation,
        }
    }

    /// Tear down both orchestrators
    pub fn teardown(&mut self) {
        self.generation.teardown();
        self.ideation.teardown();
    }
}

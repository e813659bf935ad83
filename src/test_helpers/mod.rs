// Test Helpers Module - Scripted Job Service
//
// In-memory JobService used by unit and integration tests. Responses are
// scripted up front and may carry artificial latency so timer behaviour can
// be exercised on tokio's paused clock.

pub mod scripted_service;

pub use scripted_service::{PollStep, ScriptedJobService};

//! Progress estimation for a running job
//!
//! [`AttemptTracker`] turns the server's `retry_count` into the attempt being
//! shown, and [`ProgressEstimator`] turns elapsed time within that attempt into
//! a fraction of the overall bar.

pub mod attempt_tracker;
pub mod estimator;

pub use attempt_tracker::{AttemptState, AttemptTracker};
pub use estimator::{ProgressEstimator, ProgressSnapshot};

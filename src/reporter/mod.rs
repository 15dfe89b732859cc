//! Client-side step reporter used by test-automation code.
//!
//! A [`StepLog`] is owned by one test execution and collects its steps; a
//! [`ResultSubmitter`] sends the finished run to the reporting server.

pub mod step_log;
pub mod submitter;

pub use step_log::{COMPONENTS_USED_MARKER, StepLog};
pub use submitter::{ReporterConfig, ReportingError, ResultSubmitter, RunOutcome};

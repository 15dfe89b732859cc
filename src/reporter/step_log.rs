//! Ordered step log for a single test execution.

use chrono::Utc;

use crate::models::{StepPayload, StepStatus};

/// Prefix of the message recorded for passing steps with a component trail.
/// Error clustering excludes messages that contain it.
pub const COMPONENTS_USED_MARKER: &str = "Components used:";

/// Message for passing steps that used no named components.
pub const DEFAULT_PASS_MESSAGE: &str = "Step executed successfully";

/// Steps recorded so far, plus the components touched since the last step.
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<StepPayload>,
    components: Vec<String>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that the current step used `name`.
    pub fn use_component(&mut self, name: impl Into<String>) {
        self.components.push(name.into());
    }

    /// Append a step numbered after the previous one.
    ///
    /// Passing steps recorded without a message get the component trail (or
    /// [`DEFAULT_PASS_MESSAGE`]) as their message. The trail is reset either way.
    pub fn record_step(
        &mut self,
        description: impl Into<String>,
        status: StepStatus,
        error_message: Option<String>,
    ) -> &StepPayload {
        let components = std::mem::take(&mut self.components);
        let error_message = match (status, error_message) {
            (StepStatus::Pass, None) if components.is_empty() => {
                Some(DEFAULT_PASS_MESSAGE.to_string())
            }
            (StepStatus::Pass, None) => Some(format!(
                "{} {}",
                COMPONENTS_USED_MARKER,
                components.join(", ")
            )),
            (_, message) => message,
        };

        self.steps.push(StepPayload {
            step_number: self.steps.len() as i32 + 1,
            step_description: description.into(),
            step_status: status,
            error_message,
            timestamp: Utc::now(),
        });
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[StepPayload] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drop all steps and the pending component trail.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.components.clear();
    }

    /// Move the recorded steps out, leaving the log empty.
    pub fn take(&mut self) -> Vec<StepPayload> {
        self.components.clear();
        std::mem::take(&mut self.steps)
    }
}

use serde::Serialize;

use crate::error::AutofillError;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// UI-facing progress states for one autofill operation. Ordering is
/// monotonic forward; failure is reachable from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ProgressState {
    Detecting,
    Analyzing,
    Matching,
    ShowingPreview,
    Completed,
    Failed { message: String },
}

impl ProgressState {
    fn rank(&self) -> u8 {
        match self {
            ProgressState::Detecting => 0,
            ProgressState::Analyzing => 1,
            ProgressState::Matching => 2,
            ProgressState::ShowingPreview => 3,
            ProgressState::Completed => 4,
            ProgressState::Failed { .. } => u8::MAX,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ProgressState::Completed | ProgressState::Failed { .. })
    }
}

/// Validates transitions and broadcasts each one to the trace log.
pub struct ProgressTracker {
    state: Option<ProgressState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self { state: None }
    }

    pub fn state(&self) -> Option<&ProgressState> {
        self.state.as_ref()
    }

    /// Move forward to `next`. Backward or repeated transitions, and any
    /// transition out of a terminal state, are contract violations.
    pub fn advance(&mut self, next: ProgressState, tracer: &TraceLogger) -> Result<(), AutofillError> {
        if matches!(next, ProgressState::Failed { .. }) {
            return Err(AutofillError::MissingState(
                "use fail() to enter the failed state".into(),
            ));
        }

        if let Some(current) = &self.state {
            if current.is_terminal() {
                return Err(AutofillError::MissingState(format!(
                    "progress already terminal at {:?}",
                    current
                )));
            }
            if next.rank() <= current.rank() {
                return Err(AutofillError::MissingState(format!(
                    "progress cannot move from {:?} to {:?}",
                    current, next
                )));
            }
        }

        tracer.log(&TraceEvent::stage("progress").with_detail(format!("{:?}", next)));
        self.state = Some(next);
        Ok(())
    }

    /// Enter the terminal failed state from any non-terminal state.
    pub fn fail(&mut self, message: &str, tracer: &TraceLogger) -> Result<(), AutofillError> {
        if let Some(current) = &self.state {
            if current.is_terminal() {
                return Err(AutofillError::MissingState(format!(
                    "progress already terminal at {:?}",
                    current
                )));
            }
        }

        tracer.log(&TraceEvent::stage("progress").with_detail(format!("failed: {}", message)));
        self.state = Some(ProgressState::Failed {
            message: message.to_string(),
        });
        Ok(())
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

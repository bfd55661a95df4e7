use std::fmt;

/// Why a single item failed. Captured for observability and redelivery
/// accounting only; the queue boundary sees just the failed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The item carries no usable action selector attribute.
    InvalidSelector,
    /// The selector is well-formed but outside the supported action set.
    UnsupportedAction,
    /// The action handler returned an error or its task aborted.
    ExecutionError,
    /// The action did not settle before the caller-supplied deadline.
    Timeout,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidSelector => "invalid-selector",
            FailureReason::UnsupportedAction => "unsupported-action",
            FailureReason::ExecutionError => "execution-error",
            FailureReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of processing one item. Exactly one outcome exists per
/// item once the batch has settled; outcomes are never merged across items.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub item_id: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed(FailureReason),
}

impl ItemOutcome {
    pub fn succeeded(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            status: OutcomeStatus::Succeeded,
        }
    }

    pub fn failed(item_id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            item_id: item_id.into(),
            status: OutcomeStatus::Failed(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed(reason) => Some(reason),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("action failed: {0}")]
    ExecutionFailed(#[from] anyhow::Error),
}

pub type ActionResult<T> = Result<T, ActionError>;

use crate::domain::{ActionError, ActionResult, ActionSelector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// One named action, performed asynchronously against a downstream system.
///
/// Implementations report failure by returning `Err`, never by panicking
/// through the call site. The queue delivers at least once, so the same
/// payload may be handled again after a redelivery; idempotence of the
/// underlying effect is the implementation's responsibility.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, payload: &str) -> ActionResult<()>;
}

/// Dispatch table from selector to handler, assembled once at startup.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionSelector, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(
        mut self,
        selector: ActionSelector,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        self.handlers.insert(selector, handler);
        self
    }

    pub fn supports(&self, selector: ActionSelector) -> bool {
        self.handlers.contains_key(&selector)
    }

    /// Route one action by its wire selector. Selectors outside the closed
    /// set, and selectors without a registered handler, fall through to
    /// `UnsupportedAction`.
    pub async fn execute(&self, selector: &str, payload: &str) -> ActionResult<()> {
        let action = ActionSelector::parse(selector)
            .ok_or_else(|| ActionError::UnsupportedAction(selector.to_string()))?;
        let handler = self
            .handlers
            .get(&action)
            .ok_or_else(|| ActionError::UnsupportedAction(selector.to_string()))?;
        handler.handle(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_routes_to_the_registered_handler() {
        let mut handler = MockActionHandler::new();
        handler
            .expect_handle()
            .withf(|payload| payload == r#"{"task_id":"t-1"}"#)
            .times(1)
            .returning(|_| Ok(()));

        let registry =
            ActionRegistry::new().with_handler(ActionSelector::TaskCreated, Arc::new(handler));

        let result = registry
            .execute("task_created", r#"{"task_id":"t-1"}"#)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_selector_is_unsupported() {
        let registry = ActionRegistry::new();

        let result = registry.execute("unsupported_action", "{}").await;

        assert!(matches!(result, Err(ActionError::UnsupportedAction(_))));
    }

    #[tokio::test]
    async fn test_selector_without_handler_is_unsupported() {
        let mut handler = MockActionHandler::new();
        handler.expect_handle().never();

        let registry =
            ActionRegistry::new().with_handler(ActionSelector::TaskCreated, Arc::new(handler));

        let result = registry.execute("task_deleted", "{}").await;

        assert!(matches!(result, Err(ActionError::UnsupportedAction(_))));
        assert!(!registry.supports(ActionSelector::TaskDeleted));
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let mut handler = MockActionHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(ActionError::ExecutionFailed(anyhow::anyhow!("boom"))));

        let registry =
            ActionRegistry::new().with_handler(ActionSelector::TaskUpdated, Arc::new(handler));

        let result = registry.execute("task_updated", "{}").await;

        assert!(matches!(result, Err(ActionError::ExecutionFailed(_))));
    }
}

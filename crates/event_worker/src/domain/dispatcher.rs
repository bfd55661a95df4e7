use crate::domain::{ActionError, ActionRegistry, EVENT_ATTRIBUTE};
use common::batch::{BatchItem, FailureReason, ItemOutcome};
use std::sync::Arc;
use tracing::{info, warn};

/// Routes one validated item to its action and folds every failure mode into
/// a terminal `ItemOutcome`. Nothing escapes the per-item boundary, so one
/// item's fault can never abort sibling processing.
pub struct ItemDispatcher {
    registry: Arc<ActionRegistry>,
}

impl ItemDispatcher {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn dispatch(&self, item: &BatchItem) -> ItemOutcome {
        let Some(selector) = item.attributes.get(EVENT_ATTRIBUTE) else {
            warn!(
                item_id = %item.id,
                reason = %FailureReason::InvalidSelector,
                "item carries no action selector"
            );
            return ItemOutcome::failed(item.id.clone(), FailureReason::InvalidSelector);
        };

        let payload = String::from_utf8_lossy(&item.payload);
        match self.registry.execute(selector, &payload).await {
            Ok(()) => {
                info!(
                    item_id = %item.id,
                    action = %selector,
                    outcome = "succeeded",
                    "processed item"
                );
                ItemOutcome::succeeded(item.id.clone())
            }
            Err(error @ ActionError::UnsupportedAction(_)) => {
                warn!(
                    item_id = %item.id,
                    action = %selector,
                    reason = %FailureReason::UnsupportedAction,
                    error = %error,
                    "failed to process item"
                );
                ItemOutcome::failed(item.id.clone(), FailureReason::UnsupportedAction)
            }
            Err(error) => {
                warn!(
                    item_id = %item.id,
                    action = %selector,
                    reason = %FailureReason::ExecutionError,
                    error = %error,
                    "failed to process item"
                );
                ItemOutcome::failed(item.id.clone(), FailureReason::ExecutionError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionSelector, MockActionHandler};
    use bytes::Bytes;
    use common::batch::OutcomeStatus;
    use std::collections::BTreeMap;

    fn item(id: &str, attributes: &[(&str, &str)]) -> BatchItem {
        BatchItem {
            id: id.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<String, String>>(),
            payload: Bytes::from_static(b"{}"),
        }
    }

    fn dispatcher_with(selector: ActionSelector, handler: MockActionHandler) -> ItemDispatcher {
        let registry = ActionRegistry::new().with_handler(selector, Arc::new(handler));
        ItemDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_successful_dispatch() {
        let mut handler = MockActionHandler::new();
        handler.expect_handle().times(1).returning(|_| Ok(()));

        let dispatcher = dispatcher_with(ActionSelector::TaskCreated, handler);
        let outcome = dispatcher
            .dispatch(&item("a", &[("event", "task_created")]))
            .await;

        assert_eq!(outcome.item_id, "a");
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_selector_fails_without_invoking_executor() {
        let mut handler = MockActionHandler::new();
        handler.expect_handle().never();

        let dispatcher = dispatcher_with(ActionSelector::TaskCreated, handler);
        let outcome = dispatcher.dispatch(&item("a", &[("source", "api")])).await;

        assert_eq!(
            outcome.status,
            OutcomeStatus::Failed(FailureReason::InvalidSelector)
        );
    }

    #[tokio::test]
    async fn test_unsupported_selector() {
        let mut handler = MockActionHandler::new();
        handler.expect_handle().never();

        let dispatcher = dispatcher_with(ActionSelector::TaskCreated, handler);
        let outcome = dispatcher
            .dispatch(&item("b", &[("event", "unsupported_action")]))
            .await;

        assert_eq!(
            outcome.status,
            OutcomeStatus::Failed(FailureReason::UnsupportedAction)
        );
    }

    #[tokio::test]
    async fn test_executor_failure_becomes_execution_error() {
        let mut handler = MockActionHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(ActionError::ExecutionFailed(anyhow::anyhow!("downstream 503"))));

        let dispatcher = dispatcher_with(ActionSelector::TaskCreated, handler);
        let outcome = dispatcher
            .dispatch(&item("c", &[("event", "task_created")]))
            .await;

        assert_eq!(
            outcome.status,
            OutcomeStatus::Failed(FailureReason::ExecutionError)
        );
    }
}

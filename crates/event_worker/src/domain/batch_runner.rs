use crate::domain::ItemDispatcher;
use common::batch::{BatchEnvelope, FailureReason, ItemOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Runner knobs supplied by the caller.
///
/// `item_timeout` bounds how long one item may run before it is forcibly
/// marked failed instead of being left unresolved. `None` leaves items
/// unbounded; the surrounding execution environment is then the only
/// deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchRunnerConfig {
    pub item_timeout: Option<Duration>,
}

/// Fans a validated batch out to the dispatcher, one task per item, and
/// waits for every task to settle.
///
/// There is no fail-fast path and no cancellation of siblings: the queue
/// boundary redelivers by item identifier, so aborting a batch early would
/// only add latency without saving any work. This layer imposes no
/// concurrency cap; admission control belongs to whatever backs the action
/// handlers.
pub struct BatchRunner {
    dispatcher: Arc<ItemDispatcher>,
    config: BatchRunnerConfig,
}

impl BatchRunner {
    pub fn new(dispatcher: Arc<ItemDispatcher>, config: BatchRunnerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Returns exactly one outcome per item once all of them have settled.
    /// No ordering of outcomes is guaranteed.
    pub async fn run(&self, envelope: BatchEnvelope) -> Vec<ItemOutcome> {
        let mut handles: Vec<(String, JoinHandle<ItemOutcome>)> =
            Vec::with_capacity(envelope.len());

        for item in envelope.into_items() {
            let dispatcher = Arc::clone(&self.dispatcher);
            let item_timeout = self.config.item_timeout;
            let item_id = item.id.clone();

            let handle = tokio::spawn(async move {
                match item_timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, dispatcher.dispatch(&item)).await {
                            Ok(outcome) => outcome,
                            Err(_) => {
                                warn!(
                                    item_id = %item.id,
                                    timeout_ms = limit.as_millis() as u64,
                                    reason = %FailureReason::Timeout,
                                    "item did not settle before the deadline"
                                );
                                ItemOutcome::failed(item.id.clone(), FailureReason::Timeout)
                            }
                        }
                    }
                    None => dispatcher.dispatch(&item).await,
                }
            });
            handles.push((item_id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (item_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(item_id = %item_id, error = %e, "item task aborted");
                    ItemOutcome::failed(item_id, FailureReason::ExecutionError)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ActionHandler, ActionRegistry, ActionResult, ActionSelector, EVENT_ATTRIBUTE,
    };
    use async_trait::async_trait;
    use common::batch::{OutcomeStatus, RawBatch, RawBatchItem, validate_batch};
    use std::collections::BTreeMap;
    use tokio::sync::Barrier;

    fn envelope_of(items: Vec<(&str, &str)>) -> BatchEnvelope {
        let raw = RawBatch::new(
            items
                .into_iter()
                .map(|(id, event)| {
                    let mut attributes = BTreeMap::new();
                    attributes.insert(EVENT_ATTRIBUTE.to_string(), event.to_string());
                    RawBatchItem::new(id, Some(attributes), "{}")
                })
                .collect(),
        );
        validate_batch(raw).unwrap()
    }

    fn runner_with(handler: Arc<dyn ActionHandler>, config: BatchRunnerConfig) -> BatchRunner {
        let registry = ActionRegistry::new().with_handler(ActionSelector::TaskCreated, handler);
        BatchRunner::new(Arc::new(ItemDispatcher::new(Arc::new(registry))), config)
    }

    struct PayloadDriven;

    #[async_trait]
    impl ActionHandler for PayloadDriven {
        async fn handle(&self, payload: &str) -> ActionResult<()> {
            if payload.contains("fail") {
                Err(crate::domain::ActionError::ExecutionFailed(anyhow::anyhow!(
                    "requested failure"
                )))
            } else {
                Ok(())
            }
        }
    }

    struct SlowAction(Duration);

    #[async_trait]
    impl ActionHandler for SlowAction {
        async fn handle(&self, _payload: &str) -> ActionResult<()> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    struct PanickingAction;

    #[async_trait]
    impl ActionHandler for PanickingAction {
        async fn handle(&self, _payload: &str) -> ActionResult<()> {
            panic!("handler bug");
        }
    }

    struct BarrierAction(Arc<Barrier>);

    #[async_trait]
    impl ActionHandler for BarrierAction {
        async fn handle(&self, _payload: &str) -> ActionResult<()> {
            self.0.wait().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_outcome_per_item() {
        let runner = runner_with(Arc::new(PayloadDriven), BatchRunnerConfig::default());

        for count in [1usize, 5] {
            let items: Vec<(String, String)> = (0..count)
                .map(|i| (format!("id{i}"), "task_created".to_string()))
                .collect();
            let refs: Vec<(&str, &str)> = items
                .iter()
                .map(|(id, event)| (id.as_str(), event.as_str()))
                .collect();

            let outcomes = runner.run(envelope_of(refs)).await;
            assert_eq!(outcomes.len(), count);
        }
    }

    #[tokio::test]
    async fn test_fault_isolation_across_siblings() {
        // Item 2 asks its handler to fail; items 1 and 3 must be untouched.
        let registry = ActionRegistry::new()
            .with_handler(ActionSelector::TaskCreated, Arc::new(PayloadDriven));
        let runner = BatchRunner::new(
            Arc::new(ItemDispatcher::new(Arc::new(registry))),
            BatchRunnerConfig::default(),
        );

        let raw = RawBatch::new(vec![
            RawBatchItem::new("id1", Some(event_attrs("task_created")), "{}"),
            RawBatchItem::new("id2", Some(event_attrs("task_created")), r#"{"fail":true}"#),
            RawBatchItem::new("id3", Some(event_attrs("task_created")), "{}"),
        ]);
        let outcomes = runner.run(validate_batch(raw).unwrap()).await;

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.item_id.as_str())
            .collect();
        assert_eq!(failed, vec!["id2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marks_only_the_slow_item_failed() {
        let registry = ActionRegistry::new()
            .with_handler(
                ActionSelector::TaskCreated,
                Arc::new(SlowAction(Duration::from_secs(60))),
            )
            .with_handler(
                ActionSelector::TaskUpdated,
                Arc::new(SlowAction(Duration::from_millis(10))),
            );
        let runner = BatchRunner::new(
            Arc::new(ItemDispatcher::new(Arc::new(registry))),
            BatchRunnerConfig {
                item_timeout: Some(Duration::from_millis(200)),
            },
        );

        let outcomes = runner
            .run(envelope_of(vec![
                ("slow", "task_created"),
                ("fast", "task_updated"),
            ]))
            .await;

        let slow = outcomes.iter().find(|o| o.item_id == "slow").unwrap();
        let fast = outcomes.iter().find(|o| o.item_id == "fast").unwrap();
        assert_eq!(slow.status, OutcomeStatus::Failed(FailureReason::Timeout));
        assert!(fast.is_success());
    }

    #[tokio::test]
    async fn test_panicking_handler_fails_only_its_own_item() {
        let registry = ActionRegistry::new()
            .with_handler(ActionSelector::TaskCreated, Arc::new(PanickingAction))
            .with_handler(ActionSelector::TaskUpdated, Arc::new(PayloadDriven));
        let runner = BatchRunner::new(
            Arc::new(ItemDispatcher::new(Arc::new(registry))),
            BatchRunnerConfig::default(),
        );

        let outcomes = runner
            .run(envelope_of(vec![
                ("bad", "task_created"),
                ("good", "task_updated"),
            ]))
            .await;

        let bad = outcomes.iter().find(|o| o.item_id == "bad").unwrap();
        let good = outcomes.iter().find(|o| o.item_id == "good").unwrap();
        assert_eq!(
            bad.status,
            OutcomeStatus::Failed(FailureReason::ExecutionError)
        );
        assert!(good.is_success());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_items_run_concurrently() {
        // Every handler parks on a shared barrier sized to the batch; the
        // batch can only settle if all items are in flight at once.
        let barrier = Arc::new(Barrier::new(3));
        let runner = runner_with(
            Arc::new(BarrierAction(barrier)),
            BatchRunnerConfig::default(),
        );

        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(envelope_of(vec![
                ("1", "task_created"),
                ("2", "task_created"),
                ("3", "task_created"),
            ])),
        )
        .await
        .expect("batch did not run concurrently");

        assert!(outcomes.iter().all(|o| o.is_success()));
    }

    fn event_attrs(event: &str) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        attributes.insert(EVENT_ATTRIBUTE.to_string(), event.to_string());
        attributes
    }
}

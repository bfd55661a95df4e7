use crate::domain::{
    ActionRegistry, BatchRunner, BatchRunnerConfig, EventBatchService, ItemDispatcher,
};
use crate::queue::create_event_batch_processor;
use common::queue::{BatchConsumer, NatsClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct EventWorkerConfig {
    pub stream: String,
    pub consumer_name: String,
    pub filter_subject: String,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
    /// Optional per-item deadline; items still unsettled when it lapses are
    /// reported failed and left to the broker to redeliver.
    pub action_timeout_ms: Option<u64>,
}

/// Wires the action registry into a batch consumer on the task-event stream.
pub struct EventWorker {
    consumer: BatchConsumer,
}

impl EventWorker {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        registry: Arc<ActionRegistry>,
        config: EventWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("initializing event worker");

        let dispatcher = Arc::new(ItemDispatcher::new(registry));
        let runner = BatchRunner::new(
            dispatcher,
            BatchRunnerConfig {
                item_timeout: config.action_timeout_ms.map(Duration::from_millis),
            },
        );
        let service = Arc::new(EventBatchService::new(runner));

        let source = nats_client
            .event_source(&config.stream, &config.consumer_name, &config.filter_subject)
            .await?;
        let consumer = BatchConsumer::new(
            Arc::new(source),
            config.batch_size,
            config.batch_wait_secs,
            create_event_batch_processor(service),
        );

        info!("event worker initialized");
        Ok(Self { consumer })
    }

    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
            > + Send,
    > {
        Box::new({
            let consumer = self.consumer;
            move |ctx| Box::pin(async move { consumer.run(ctx).await })
        })
    }
}

use crate::batch::{FailureReport, RawBatch};
use crate::queue::{Acknowledger, EventSource};
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Processes one fetched batch and names the identifiers that must be
/// redelivered. Deserialization and business logic live behind this closure;
/// the consumer only settles deliveries from the returned report.
pub type BatchProcessor =
    Box<dyn Fn(RawBatch) -> BoxFuture<'static, Result<FailureReport>> + Send + Sync>;

/// Pull-based batch consumer with per-message partial acknowledgment.
///
/// Each cycle fetches a batch, hands it to the processor, then settles every
/// delivery individually: identifiers named by the returned `FailureReport`
/// are negative-acknowledged for redelivery, all others are acknowledged.
/// The processor is expected to always produce a report; an error from it is
/// an infrastructure fault and rejects the entire fetch.
pub struct BatchConsumer {
    source: Arc<dyn EventSource>,
    batch_size: usize,
    max_wait: Duration,
    processor: BatchProcessor,
}

impl BatchConsumer {
    pub fn new(
        source: Arc<dyn EventSource>,
        batch_size: usize,
        max_wait_secs: u64,
        processor: BatchProcessor,
    ) -> Self {
        Self {
            source,
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            processor,
        }
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("starting consumer loop");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("received shutdown signal, stopping consumer");
                    break;
                }
                result = self.run_once() => {
                    if let Err(e) = result {
                        error!(error = %e, "error processing batch");
                        // Transient infrastructure fault; keep consuming.
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!("consumer stopped gracefully");
        Ok(())
    }

    /// Drive a single fetch → process → settle cycle.
    pub async fn run_once(&self) -> Result<()> {
        let deliveries = self.source.fetch(self.batch_size, self.max_wait).await?;
        if deliveries.is_empty() {
            debug!("no messages in batch");
            return Ok(());
        }

        debug!(message_count = deliveries.len(), "received message batch");

        let mut items = Vec::with_capacity(deliveries.len());
        let mut ackers: Vec<(String, Box<dyn Acknowledger>)> = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let (item, acker) = delivery.into_parts();
            ackers.push((item.id.clone(), acker));
            items.push(item);
        }

        let report = match (self.processor)(RawBatch::new(items)).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "processor returned error, rejecting all messages");
                FailureReport::all_failed(ackers.iter().map(|(id, _)| id.clone()))
            }
        };

        let mut ack_count = 0usize;
        let mut nak_count = 0usize;
        for (id, acker) in &ackers {
            if report.contains(id) {
                nak_count += 1;
                if let Err(e) = acker.nak().await {
                    error!(item_id = %id, error = %e, "failed to reject message");
                }
            } else {
                ack_count += 1;
                if let Err(e) = acker.ack().await {
                    error!(item_id = %id, error = %e, "failed to acknowledge message");
                }
            }
        }

        debug!(ack_count, nak_count, "settled message batch");
        Ok(())
    }
}

use crate::domain::BatchRunner;
use common::batch::{FailureReport, RawBatch, validate_batch};
use tracing::{debug, instrument, warn};

/// Top-level batch operation: validate the envelope, fan the items out, and
/// reduce the outcomes to the redelivery report.
///
/// Always completes with a report. A structurally invalid envelope has no
/// safe partial interpretation, so every raw identifier is reported failed
/// and nothing is dispatched; every other fault stays local to its item.
/// Error detail goes to the logs; the report's only job is to drive
/// redelivery.
pub struct EventBatchService {
    runner: BatchRunner,
}

impl EventBatchService {
    pub fn new(runner: BatchRunner) -> Self {
        Self { runner }
    }

    #[instrument(skip(self, raw), fields(item_count = raw.items.len()))]
    pub async fn process(&self, raw: RawBatch) -> FailureReport {
        let item_ids = raw.item_ids();

        let envelope = match validate_batch(raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(
                    error = %error,
                    item_count = item_ids.len(),
                    "rejecting structurally invalid batch"
                );
                return FailureReport::all_failed(item_ids);
            }
        };

        let outcomes = self.runner.run(envelope).await;
        let report = FailureReport::from_outcomes(&outcomes);

        debug!(
            item_count = outcomes.len(),
            failed_count = report.len(),
            "batch settled"
        );
        report
    }
}

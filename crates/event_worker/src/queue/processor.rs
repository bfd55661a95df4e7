use crate::domain::EventBatchService;
use common::batch::RawBatch;
use common::queue::BatchProcessor;
use std::sync::Arc;

/// Adapt the batch service to the consumer loop's processor interface.
///
/// The service is infallible by contract, so the closure's error path is
/// never taken for business faults; those end up in the failure report.
pub fn create_event_batch_processor(service: Arc<EventBatchService>) -> BatchProcessor {
    Box::new(move |batch: RawBatch| {
        let service = Arc::clone(&service);
        Box::pin(async move { Ok(service.process(batch).await) })
    })
}

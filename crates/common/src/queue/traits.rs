use crate::batch::RawBatchItem;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;

/// One message pulled from the queue, owned, together with its settlement
/// handle. Owning the data keeps the consumer loop and its tests free of
/// broker message lifetimes.
pub struct Delivery {
    /// Queue-assigned identifier, unique within a fetch, stable across
    /// redeliveries of the same message.
    pub id: String,
    /// Named message attributes; `None` when the message carried no
    /// attribute map at all.
    pub attributes: Option<BTreeMap<String, String>>,
    /// Opaque message body.
    pub payload: Bytes,
    pub acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub fn into_parts(self) -> (RawBatchItem, Box<dyn Acknowledger>) {
        (
            RawBatchItem::new(self.id, self.attributes, self.payload),
            self.acker,
        )
    }
}

/// Settles a single delivery with the broker.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Acknowledge: the broker must not redeliver this message.
    async fn ack(&self) -> Result<()>;

    /// Negative-acknowledge: the broker should redeliver this message.
    async fn nak(&self) -> Result<()>;
}

/// Source of queue deliveries, pulled in batches.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch up to `max_items` deliveries, waiting at most `max_wait` for
    /// the batch to fill. An empty result is a normal idle cycle.
    async fn fetch(&self, max_items: usize, max_wait: Duration) -> Result<Vec<Delivery>>;
}

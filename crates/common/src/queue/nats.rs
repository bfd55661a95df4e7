use crate::queue::{Acknowledger, Delivery, EventSource};
use anyhow::{Context, Result};
use async_nats::HeaderMap;
use async_nats::jetstream::{self, AckKind, Message, stream::Config as StreamConfig};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// Thin wrapper around a NATS connection and its JetStream context.
pub struct NatsClient {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis() as u64, "connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("failed to connect to NATS")?;

        let jetstream = jetstream::new(client.clone());

        info!("successfully connected to NATS");
        Ok(Self { client, jetstream })
    }

    pub async fn ensure_stream(&self, stream_name: &str) -> Result<()> {
        info!(stream = %stream_name, "ensuring stream exists");

        let stream_config = StreamConfig {
            name: stream_name.to_string(),
            subjects: vec![format!("{stream_name}.>")],
            ..Default::default()
        };

        match self.jetstream.get_stream(stream_name).await {
            Ok(_) => {
                info!(stream = %stream_name, "stream already exists");
            }
            Err(_) => {
                self.jetstream
                    .create_stream(stream_config)
                    .await
                    .context("failed to create stream")?;
                info!(stream = %stream_name, "created stream");
            }
        }

        Ok(())
    }

    /// Create a durable pull consumer on `stream_name` and wrap it as an
    /// `EventSource` for the batch consumer loop.
    pub async fn event_source(
        &self,
        stream_name: &str,
        consumer_name: &str,
        filter_subject: &str,
    ) -> Result<NatsEventSource> {
        info!(
            stream = %stream_name,
            consumer = %consumer_name,
            subject = %filter_subject,
            "creating JetStream consumer"
        );

        let consumer = self
            .jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: filter_subject.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .context("failed to create consumer")?;

        Ok(NatsEventSource { consumer })
    }

    pub async fn close(self) {
        info!("closing NATS connection");
        drop(self.client);
    }
}

/// `EventSource` backed by a JetStream durable pull consumer. The item
/// identifier is the stream sequence (queue-assigned, stable across
/// redeliveries); the attribute map comes from the message headers.
pub struct NatsEventSource {
    consumer: jetstream::consumer::PullConsumer,
}

#[async_trait]
impl EventSource for NatsEventSource {
    async fn fetch(&self, max_items: usize, max_wait: Duration) -> Result<Vec<Delivery>> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(max_items)
            .expires(max_wait)
            .messages()
            .await
            .context("failed to fetch messages")?;

        let mut deliveries = Vec::new();
        while let Some(next) = messages.next().await {
            match next {
                Ok(message) => match delivery_from_message(message) {
                    Ok(delivery) => deliveries.push(delivery),
                    Err(e) => {
                        // No stream metadata means no usable identifier; the
                        // message redelivers once its ack deadline lapses.
                        warn!(error = %e, "dropping message without stream metadata");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "error receiving message from batch");
                }
            }
        }

        Ok(deliveries)
    }
}

fn delivery_from_message(message: Message) -> Result<Delivery> {
    let id = {
        let info = message
            .info()
            .map_err(|e| anyhow::anyhow!("missing stream metadata: {e}"))?;
        info.stream_sequence.to_string()
    };
    let attributes = message.headers.as_ref().map(headers_to_attributes);
    let payload = message.payload.clone();

    Ok(Delivery {
        id,
        attributes,
        payload,
        acker: Box::new(NatsAcknowledger { message }),
    })
}

/// First value wins for repeated header names; attribute maps are flat.
fn headers_to_attributes(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for (name, values) in headers.iter() {
        if let Some(value) = values.first() {
            attributes
                .entry(name.to_string())
                .or_insert_with(|| value.as_str().to_string());
        }
    }
    attributes
}

struct NatsAcknowledger {
    message: Message,
}

#[async_trait]
impl Acknowledger for NatsAcknowledger {
    async fn ack(&self) -> Result<()> {
        self.message
            .ack()
            .await
            .map_err(|e| anyhow::anyhow!("failed to acknowledge message: {e}"))
    }

    async fn nak(&self) -> Result<()> {
        self.message
            .ack_with(AckKind::Nak(None))
            .await
            .map_err(|e| anyhow::anyhow!("failed to reject message: {e}"))
    }
}

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream name for task events
    #[serde(default = "default_task_events_stream")]
    pub task_events_stream: String,

    /// Subject pattern for the task-event consumer filter
    #[serde(default = "default_task_events_subject")]
    pub task_events_subject: String,

    /// Durable consumer name
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    /// Batch size for the consumer fetch
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Worker configuration
    /// Per-item action deadline in milliseconds; unset means no deadline
    #[serde(default)]
    pub action_timeout_ms: Option<u64>,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for the OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_task_events_stream() -> String {
    "task_events".to_string()
}

fn default_task_events_subject() -> String {
    "task_events.>".to_string()
}

fn default_consumer_name() -> String {
    "relay-event-worker".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "relay-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("RELAY"))
            .build()?
            .try_deserialize()
    }
}

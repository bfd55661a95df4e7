mod config;

use common::queue::NatsClient;
use common::telemetry::{TelemetryConfig, init_telemetry, shutdown_telemetry};
use config::ServiceConfig;
use event_worker::domain::{ActionRegistry, ActionSelector, SimulatedAction};
use event_worker::{EventWorker, EventWorkerConfig};
use relay_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Latency of the stand-in actions until real downstream integrations exist.
const SIMULATED_ACTION_LATENCY: Duration = Duration::from_millis(25);

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let telemetry_providers = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("failed to initialize telemetry: {e}");
            std::process::exit(1);
        }
    };

    info!(
        stream = %config.task_events_stream,
        consumer = %config.consumer_name,
        "starting relay-all-in-one service"
    );
    debug!("configuration: {:?}", config);

    let nats_client = match initialize_nats(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("failed to initialize NATS: {e:#}");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(build_registry());

    let worker = match EventWorker::new(
        Arc::clone(&nats_client),
        registry,
        EventWorkerConfig {
            stream: config.task_events_stream.clone(),
            consumer_name: config.consumer_name.clone(),
            filter_subject: config.task_events_subject.clone(),
            batch_size: config.nats_batch_size,
            batch_wait_secs: config.nats_batch_wait_secs,
            action_timeout_ms: config.action_timeout_ms,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("failed to initialize event worker: {e:#}");
            std::process::exit(1);
        }
    };

    let runner = Runner::new()
        .with_named_process("event_worker", worker.into_runner_process())
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || async move {
                info!("running cleanup tasks");
                if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                    client.close().await;
                }
                shutdown_telemetry(telemetry_providers);
                info!("cleanup complete");
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    if let Err(e) = runner.run().await {
        error!("service exited with error: {e:#}");
        std::process::exit(1);
    }

    info!("service exited normally");
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<Arc<NatsClient>> {
    info!("initializing NATS");
    let client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );
    client.ensure_stream(&config.task_events_stream).await?;
    Ok(client)
}

fn build_registry() -> ActionRegistry {
    ActionRegistry::new()
        .with_handler(
            ActionSelector::TaskCreated,
            Arc::new(SimulatedAction::new("task_created", SIMULATED_ACTION_LATENCY)),
        )
        .with_handler(
            ActionSelector::TaskUpdated,
            Arc::new(SimulatedAction::new("task_updated", SIMULATED_ACTION_LATENCY)),
        )
        .with_handler(
            ActionSelector::TaskCompleted,
            Arc::new(SimulatedAction::new("task_completed", SIMULATED_ACTION_LATENCY)),
        )
        .with_handler(
            ActionSelector::TaskDeleted,
            Arc::new(SimulatedAction::new("task_deleted", SIMULATED_ACTION_LATENCY)),
        )
}

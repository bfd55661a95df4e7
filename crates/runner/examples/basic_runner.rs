//! Basic example of using relay-runner.
//!
//! Demonstrates named concurrent processes, graceful shutdown on
//! SIGTERM/SIGINT (Ctrl+C), and cleanup closers.
//!
//! Run with: cargo run --example basic_runner

use relay_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("starting runner example, press Ctrl+C for graceful shutdown");

    let result = Runner::new()
        .with_named_process("ticker", |ctx| async move {
            let mut count = 0u64;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!(count, "ticker stopping gracefully");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        count += 1;
                        tracing::info!(count, "tick");
                    }
                }
            }
            Ok(())
        })
        .with_named_process("heartbeat", |ctx| async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!("heartbeat stopping gracefully");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(2)) => {
                        tracing::info!("still running");
                    }
                }
            }
            Ok(())
        })
        .with_closer(|| async move {
            tracing::info!("flushing buffers");
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(5))
        .run()
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "runner exited with error");
        std::process::exit(1);
    }
}

use crate::domain::{ActionHandler, ActionResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Stand-in action that models a downstream call as a fixed latency.
///
/// The worker treats every action as an opaque asynchronous capability, so a
/// deployment without real integrations can run entirely on these.
pub struct SimulatedAction {
    name: String,
    latency: Duration,
}

impl SimulatedAction {
    pub fn new(name: impl Into<String>, latency: Duration) -> Self {
        Self {
            name: name.into(),
            latency,
        }
    }
}

#[async_trait]
impl ActionHandler for SimulatedAction {
    async fn handle(&self, payload: &str) -> ActionResult<()> {
        sleep(self.latency).await;
        info!(
            action = %self.name,
            payload_bytes = payload.len(),
            "action completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_action_succeeds() {
        let action = SimulatedAction::new("task_created", Duration::from_millis(25));
        assert!(action.handle("{}").await.is_ok());
    }
}

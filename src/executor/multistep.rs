//! Multi-step routing strategy
//!
//! Orchestrator that will perform multi-step reasoning and delegate to a
//! series of specialist agents. The reasoning loop itself is extensible
//! scaffolding: today it acknowledges the request with a single artifact and
//! completes, but it owns the full task lifecycle so the dispatch and
//! cancellation paths are exercised end to end.

use crate::error::{sanitize_error_message, HubResult};
use crate::executor::{AgentExecutor, RequestContext};
use crate::protocol::{Artifact, TaskState};
use crate::task::TaskUpdater;
use async_trait::async_trait;
use tracing::{error, info};

/// Label used when this strategy completes a task without remote artifacts
const STRATEGY_LABEL: &str = "multi-step orchestrator";

/// Multi-step reasoning executor
#[derive(Debug, Default)]
pub struct MultiStepExecutor;

impl MultiStepExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentExecutor for MultiStepExecutor {
    async fn execute(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        info!(task_id = %ctx.task_id, "Multi-step orchestrator handling request");

        updater
            .transition(
                TaskState::Working,
                Some("Multi-step orchestrator is handling this request.".to_string()),
            )
            .await?;

        // The multi-step delegation loop will replace this acknowledgment.
        let response = format!(
            "This is a placeholder response from the multi-step orchestrator for the query: '{}'",
            ctx.query
        );

        let result: HubResult<()> = async {
            updater
                .add_artifact(Artifact::text("react_final_response", response))
                .await?;
            updater.complete(STRATEGY_LABEL, None).await
        }
        .await;

        if let Err(e) = result {
            error!(task_id = %ctx.task_id, "Multi-step execution failed: {}", e);
            updater
                .fail_if_active(sanitize_error_message(&format!(
                    "Multi-step routing failed: {e}"
                )))
                .await?;
        }

        Ok(())
    }

    async fn cancel(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        info!(task_id = %ctx.task_id, "Cancelling multi-step task");
        updater
            .transition(
                TaskState::Cancelled,
                Some("Multi-step routing task was cancelled.".to_string()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{InMemoryTaskStore, Task, TaskStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_execute_completes_with_acknowledgment() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("Plan my treatment research", &task_id, "conv-1");
        let updater = TaskUpdater::new(task, store.clone());

        MultiStepExecutor::new().execute(&ctx, &updater).await.unwrap();

        let final_task = store.get(&task_id).await.unwrap();
        assert_eq!(final_task.state, TaskState::Completed);
        assert_eq!(final_task.artifacts.len(), 1);
        assert_eq!(final_task.artifacts[0].name, "react_final_response");
        assert!(final_task.artifacts[0]
            .joined_text()
            .contains("Plan my treatment research"));
    }

    #[tokio::test]
    async fn test_cancel_uses_multistep_message() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("q", &task_id, "conv-1");
        let updater = TaskUpdater::new(task, store.clone());

        MultiStepExecutor::new().cancel(&ctx, &updater).await.unwrap();

        let final_task = store.get(&task_id).await.unwrap();
        assert_eq!(final_task.state, TaskState::Cancelled);
        assert_eq!(
            final_task.status_message,
            Some("Multi-step routing task was cancelled.".to_string())
        );
    }
}

//! Direct routing strategy
//!
//! Classifies the query, opens one streamed invocation against the chosen
//! specialist, and relays every remote event into the local task. Anything
//! that goes wrong after the working transition is recorded as a `failed`
//! state with the underlying cause in the status message.

use crate::client::RemoteTaskClient;
use crate::error::{sanitize_error_message, HubResult};
use crate::executor::{AgentExecutor, RequestContext};
use crate::protocol::TaskState;
use crate::registry::AgentRegistry;
use crate::routing::{RoutingClassifier, RoutingDecision};
use crate::task::{relay_stream, TaskUpdater};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// Direct single-call routing executor
pub struct RouterExecutor {
    classifier: RoutingClassifier,
    client: RemoteTaskClient,
    registry: Arc<AgentRegistry>,
}

impl RouterExecutor {
    pub fn new(
        classifier: RoutingClassifier,
        client: RemoteTaskClient,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        Self {
            classifier,
            client,
            registry,
        }
    }

    /// Open the remote stream and relay it into the task
    async fn run_remote(
        &self,
        decision: &RoutingDecision,
        ctx: &RequestContext,
        updater: &TaskUpdater,
    ) -> HubResult<()> {
        let events = self
            .client
            .invoke(&decision.selected_agent, &ctx.query)
            .await?;

        relay_stream(updater, &decision.selected_agent.name, events).await
    }
}

#[async_trait]
impl AgentExecutor for RouterExecutor {
    async fn execute(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        info!(task_id = %ctx.task_id, query = %ctx.query, "Router received query");

        updater
            .transition(
                TaskState::Working,
                Some("Analyzing query and routing to appropriate agent...".to_string()),
            )
            .await?;

        let decision = self.classifier.classify(&ctx.query, &self.registry).await;
        info!(
            agent = %decision.selected_agent.name,
            reasoning = %decision.reasoning,
            "Routing to specialist agent"
        );

        if let Err(e) = self.run_remote(&decision, ctx, updater).await {
            error!(task_id = %ctx.task_id, "Router execution failed: {}", e);
            updater
                .fail_if_active(sanitize_error_message(&format!("Routing failed: {e}")))
                .await?;
        }

        Ok(())
    }

    async fn cancel(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        info!(task_id = %ctx.task_id, "Cancelling routed task");
        updater
            .transition(
                TaskState::Cancelled,
                Some("Query routing cancelled".to_string()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubError;
    use crate::task::{InMemoryTaskStore, Task, TaskStore};
    use crate::testing::mocks::{sample_registry, MockLlmProvider};
    use std::time::Duration;

    fn executor_with(provider: MockLlmProvider) -> RouterExecutor {
        RouterExecutor::new(
            RoutingClassifier::new(Arc::new(provider), "test-model"),
            RemoteTaskClient::new(Duration::from_millis(200)).unwrap(),
            Arc::new(sample_registry()),
        )
    }

    fn updater_for(task: Task, store: Arc<InMemoryTaskStore>) -> TaskUpdater {
        TaskUpdater::new(task, store)
    }

    #[tokio::test]
    async fn test_unreachable_agent_fails_task_with_url() {
        // Registry points at closed ports, so discovery fails fast and the
        // failure message must carry the unreachable URL
        let executor = executor_with(MockLlmProvider::routes_to("medgemma", "symptoms"));
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("What are common symptoms of hypertension?", &task_id, "conv-1");
        let updater = updater_for(task, store.clone());

        executor.execute(&ctx, &updater).await.unwrap();

        let final_task = store.get(&task_id).await.unwrap();
        assert_eq!(final_task.state, TaskState::Failed);
        let message = final_task.status_message.unwrap();
        assert!(message.contains("Routing failed"));
        assert!(message.contains("http://localhost:9101"));
    }

    #[tokio::test]
    async fn test_classifier_failure_still_terminates() {
        let executor = executor_with(MockLlmProvider::with_failure());
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("anything", &task_id, "conv-1");
        let updater = updater_for(task, store.clone());

        executor.execute(&ctx, &updater).await.unwrap();

        // Fallback routed to the default agent, whose endpoint is down, so
        // the task terminates as failed rather than hanging
        let final_task = store.get(&task_id).await.unwrap();
        assert!(final_task.state.is_terminal());
    }

    #[tokio::test]
    async fn test_cancel_transitions_to_cancelled() {
        let executor = executor_with(MockLlmProvider::routes_to("medgemma", "x"));
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("q", &task_id, "conv-1");
        let updater = updater_for(task, store.clone());

        executor.cancel(&ctx, &updater).await.unwrap();

        let final_task = store.get(&task_id).await.unwrap();
        assert_eq!(final_task.state, TaskState::Cancelled);
        assert_eq!(
            final_task.status_message,
            Some("Query routing cancelled".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_after_terminal_is_programming_error() {
        let executor = executor_with(MockLlmProvider::routes_to("medgemma", "x"));
        let store = Arc::new(InMemoryTaskStore::new());
        let task = Task::new("conv-1");
        let task_id = task.id.clone();
        store.create(task.clone()).await.unwrap();

        let ctx = RequestContext::new("q", &task_id, "conv-1");
        let updater = updater_for(task, store.clone());

        updater.complete("medgemma", None).await.unwrap();
        let result = executor.cancel(&ctx, &updater).await;
        assert!(matches!(result, Err(HubError::InvalidTransition { .. })));
    }
}

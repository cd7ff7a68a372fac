//! Hub service facade
//!
//! Wires the dispatching executor, task store, and timeout policy behind the
//! two operations the caller layer sees: `route` blocks until the underlying
//! task reaches a terminal state (or the governing timeout forces a failed
//! one), `cancel` is best-effort. Failures before a task exists propagate as
//! errors; everything after is observed through the terminal task state.

use crate::client::RemoteTaskClient;
use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::executor::{
    AgentExecutor, DispatchingExecutor, MultiStepExecutor, RequestContext, RouterExecutor,
    ORCHESTRATOR_MODE_KEY,
};
use crate::llm::{OpenAiCompatConfig, OpenAiCompatProvider};
use crate::protocol::TaskState;
use crate::registry::AgentRegistry;
use crate::routing::RoutingClassifier;
use crate::task::{Task, TaskStore, TaskUpdater};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Terminal result of one routed query
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub task_id: String,
    pub state: TaskState,
    /// Final artifact text, or a placeholder when the task failed empty
    pub response: String,
}

/// Placeholder answer when a terminal task carries no artifact text
const EMPTY_RESPONSE: &str = "(No content was returned from the agent network)";

/// The routing and task orchestration core
pub struct HubService {
    executor: Arc<dyn AgentExecutor>,
    store: Arc<dyn TaskStore>,
    chat_timeout: Duration,
    default_mode: String,
    /// Live updaters for in-flight tasks, so cancellation mutates the same
    /// task object the relay loop owns instead of a stale store snapshot
    active: tokio::sync::RwLock<std::collections::HashMap<String, Arc<TaskUpdater>>>,
}

impl HubService {
    /// Assemble the service with explicit collaborators
    pub fn new(
        executor: Arc<dyn AgentExecutor>,
        store: Arc<dyn TaskStore>,
        chat_timeout: Duration,
        default_mode: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            store,
            chat_timeout,
            default_mode: default_mode.into(),
            active: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Build the full production wiring from configuration
    pub fn from_config(
        config: &HubConfig,
        store: Arc<dyn TaskStore>,
    ) -> HubResult<Self> {
        let registry = Arc::new(AgentRegistry::from_entries(
            &config.agents,
            &config.routing.default_agent,
        )?);

        let api_key = config.get_llm_api_key()?;
        let provider = OpenAiCompatProvider::new(OpenAiCompatConfig {
            base_url: config.llm.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(config.routing.invoke_timeout_secs),
        })
        .map_err(|e| HubError::llm_error(e.to_string()))?;

        let classifier = RoutingClassifier::from_config(Arc::new(provider), &config.llm);
        let client =
            RemoteTaskClient::new(Duration::from_secs(config.routing.invoke_timeout_secs))?;

        let direct = Arc::new(RouterExecutor::new(classifier, client, registry));
        let multi_step = Arc::new(MultiStepExecutor::new());
        let executor = Arc::new(DispatchingExecutor::new(direct, multi_step));

        Ok(Self::new(
            executor,
            store,
            Duration::from_secs(config.hub.chat_timeout_secs),
            config.routing.mode.clone(),
        ))
    }

    /// Route one query and block until its task is terminal.
    ///
    /// A fresh task is created when the conversation supplies none. The whole
    /// call is bounded by the configured timeout; on expiry the task is
    /// failed rather than left in `working`.
    pub async fn route(
        &self,
        query: &str,
        conversation_id: Option<String>,
        mode: Option<String>,
    ) -> HubResult<RouteOutcome> {
        let context_id =
            conversation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let task = Task::new(context_id.clone());
        let task_id = task.id.clone();
        self.store.create(task.clone()).await?;

        // Per-id exclusive mutation: no other relay loop may touch this task
        let task_lock = self.store.lock(&task_id).await;
        let _guard = task_lock.lock().await;

        let effective_mode = mode.unwrap_or_else(|| self.default_mode.clone());
        let ctx = RequestContext::new(query, &task_id, &context_id)
            .with_metadata(ORCHESTRATOR_MODE_KEY, effective_mode);

        let updater = Arc::new(TaskUpdater::new(task, self.store.clone()));
        {
            let mut active = self.active.write().await;
            active.insert(task_id.clone(), updater.clone());
        }

        let outcome = tokio::time::timeout(
            self.chat_timeout,
            self.executor.execute(&ctx, &updater),
        )
        .await;

        {
            let mut active = self.active.write().await;
            active.remove(&task_id);
        }

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(task_id = %task_id, "Executor returned an error: {}", e);
                updater.fail_if_active(e.to_status_text()).await?;
            }
            Err(_) => {
                warn!(task_id = %task_id, "Route call exceeded its timeout");
                updater
                    .fail_if_active(format!(
                        "Routing timed out after {} seconds",
                        self.chat_timeout.as_secs()
                    ))
                    .await?;
            }
        }

        // An executor must reach exactly one terminal state; enforce the
        // "never zero" half here so the caller cannot observe a live task
        updater
            .fail_if_active("Executor returned without reaching a terminal state".to_string())
            .await?;

        let final_task = self.store.get(&task_id).await?;

        info!(
            task_id = %task_id,
            state = %final_task.state,
            "Route call finished"
        );

        Ok(RouteOutcome {
            response: final_task
                .final_text()
                .unwrap_or_else(|| EMPTY_RESPONSE.to_string()),
            state: final_task.state,
            task_id,
        })
    }

    /// Best-effort cancellation of a tracked task.
    ///
    /// Returns the resulting task state. Cancelling a task that already
    /// reached a terminal state acknowledges with that state; an executor
    /// declaring cancellation unsupported surfaces the distinct
    /// `UnsupportedOperation` error untouched. For an in-flight task the
    /// live updater is reused, so the relay loop observes the terminal
    /// state on its next write instead of clobbering it.
    pub async fn cancel(&self, task_id: &str) -> HubResult<TaskState> {
        let task = self.store.get(task_id).await?;

        if task.state.is_terminal() {
            return Ok(task.state);
        }

        let live = {
            let active = self.active.read().await;
            active.get(task_id).cloned()
        };

        let ctx = RequestContext::new("", task_id, &task.context_id);
        match live {
            Some(updater) => self.executor.cancel(&ctx, &updater).await?,
            None => {
                // Re-read: the task may have finished between the two lookups
                let task = self.store.get(task_id).await?;
                if task.state.is_terminal() {
                    return Ok(task.state);
                }
                let updater = TaskUpdater::new(task, self.store.clone());
                self.executor.cancel(&ctx, &updater).await?;
            }
        }

        Ok(self.store.get(task_id).await?.state)
    }

    /// Look up a task snapshot
    pub async fn get_task(&self, task_id: &str) -> HubResult<Task> {
        self.store.get(task_id).await
    }
}

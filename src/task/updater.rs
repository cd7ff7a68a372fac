//! Task state machine updater and stream relay
//!
//! The updater is the sole writer of a task's state and artifact list during
//! one executor invocation. Transitions are monotonic forward: `working` may
//! repeat, each terminal state is reached at most once, and any call after a
//! terminal state is rejected as a programming error rather than silently
//! accepted. Every mutation is persisted to the task store so the caller
//! observes the terminal snapshot.

use crate::error::{HubError, HubResult};
use crate::protocol::{Artifact, StreamEvent, TaskState};
use crate::task::{Task, TaskStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Local lifecycle event, observable by whoever created the updater
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Status {
        state: TaskState,
        message: Option<String>,
    },
    Artifact {
        artifact: Artifact,
    },
}

/// Exclusive writer for one task during one invocation
pub struct TaskUpdater {
    task: Mutex<Task>,
    store: Arc<dyn TaskStore>,
    /// Whether any artifact was appended during this invocation
    produced_artifact: AtomicBool,
    observer: Option<mpsc::UnboundedSender<TaskEvent>>,
}

impl TaskUpdater {
    pub fn new(task: Task, store: Arc<dyn TaskStore>) -> Self {
        Self {
            task: Mutex::new(task),
            store,
            produced_artifact: AtomicBool::new(false),
            observer: None,
        }
    }

    /// Attach an observer receiving every local lifecycle event
    pub fn with_observer(mut self, sender: mpsc::UnboundedSender<TaskEvent>) -> Self {
        self.observer = Some(sender);
        self
    }

    /// Current state snapshot
    pub async fn current_state(&self) -> TaskState {
        self.task.lock().await.state
    }

    /// Snapshot of the task
    pub async fn snapshot(&self) -> Task {
        self.task.lock().await.clone()
    }

    fn emit(&self, event: TaskEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }

    /// Move to `working` (repeatable) or to a terminal state (once).
    /// Rejected once a terminal state has been reached.
    pub async fn transition(
        &self,
        state: TaskState,
        message: Option<String>,
    ) -> HubResult<()> {
        let mut task = self.task.lock().await;

        if task.state.is_terminal() {
            return Err(HubError::InvalidTransition {
                terminal_state: task.state.as_str().to_string(),
            });
        }

        debug!(
            task_id = %task.id,
            from = %task.state,
            to = %state,
            "Task transition"
        );

        task.state = state;
        task.status_message = message.clone();
        task.touch();
        self.store.save(&task).await?;
        drop(task);

        self.emit(TaskEvent::Status { state, message });
        Ok(())
    }

    /// Append an artifact; legal in any non-terminal state
    pub async fn add_artifact(&self, artifact: Artifact) -> HubResult<()> {
        let mut task = self.task.lock().await;

        if task.state.is_terminal() {
            return Err(HubError::InvalidTransition {
                terminal_state: task.state.as_str().to_string(),
            });
        }

        task.artifacts.push(artifact.clone());
        task.touch();
        self.store.save(&task).await?;
        drop(task);

        self.produced_artifact.store(true, Ordering::Relaxed);
        self.emit(TaskEvent::Artifact { artifact });
        Ok(())
    }

    /// Complete the task. When no artifact was appended during this
    /// invocation, a one-line summary artifact naming the resolved agent is
    /// substituted first so a completed task is never empty-handed.
    pub async fn complete(
        &self,
        routed_agent: &str,
        message: Option<String>,
    ) -> HubResult<()> {
        if !self.produced_artifact.load(Ordering::Relaxed) {
            self.add_artifact(Artifact::text(
                "router_summary",
                format!("Routed to {routed_agent}"),
            ))
            .await?;
        }

        self.transition(TaskState::Completed, message).await
    }

    /// Record a failure unless the task already reached a terminal state
    pub async fn fail_if_active(&self, message: String) -> HubResult<()> {
        if self.current_state().await.is_terminal() {
            return Ok(());
        }
        self.transition(TaskState::Failed, Some(message)).await
    }
}

/// Relay a remote event stream into the local task.
///
/// Events are applied strictly in arrival order. Artifact events append;
/// status events transition, synthesizing `"Routed to <agent> (<state>)"`
/// text when the event carries none. A remote `completed` status routes
/// through [`TaskUpdater::complete`] so the no-artifact substitution applies
/// there too, and at most one local `completed` transition is ever emitted.
/// When the stream ends without any terminal state, the task is completed
/// locally under the same rule.
pub async fn relay_stream(
    updater: &TaskUpdater,
    routed_agent: &str,
    mut events: mpsc::Receiver<HubResult<StreamEvent>>,
) -> HubResult<()> {
    while let Some(item) = events.recv().await {
        match item? {
            StreamEvent::Artifact(event) => {
                updater.add_artifact(event.artifact).await?;
            }
            StreamEvent::Status(event) => {
                let text = event
                    .message
                    .as_ref()
                    .and_then(|m| m.joined_text())
                    .unwrap_or_else(|| {
                        format!("Routed to {routed_agent} ({})", event.state)
                    });

                if event.state == TaskState::Completed {
                    updater.complete(routed_agent, Some(text)).await?;
                } else {
                    updater.transition(event.state, Some(text)).await?;
                }
            }
            StreamEvent::Unknown { kind } => {
                debug!(kind = %kind, "Skipping unrecognized stream event");
            }
        }
    }

    if !updater.current_state().await.is_terminal() {
        info!(
            agent = %routed_agent,
            "Remote stream ended without terminal status, completing locally"
        );
        updater.complete(routed_agent, None).await?;
    }

    Ok(())
}

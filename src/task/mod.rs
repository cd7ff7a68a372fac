//! Locally tracked tasks and their lifecycle
//!
//! A task is the unit of work for one routed query: an identifier, the
//! conversation it belongs to, the current lifecycle state, and an ordered,
//! append-only list of artifacts. One updater owns a task exclusively for the
//! duration of one executor invocation.

pub mod store;
pub mod updater;

pub use store::{InMemoryTaskStore, TaskStore};
pub use updater::{relay_stream, TaskEvent, TaskUpdater};

use crate::protocol::{Artifact, TaskState};
use serde::{Deserialize, Serialize};

/// The unit of work tracked through submitted -> working -> terminal states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub state: TaskState,
    /// Human-readable text attached by the most recent transition
    pub status_message: Option<String>,
    pub artifacts: Vec<Artifact>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Timestamp of the most recent mutation (ISO 8601)
    pub updated_at: String,
}

impl Task {
    /// Create a freshly submitted task within a conversation
    pub fn new(context_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            context_id: context_id.into(),
            state: TaskState::Submitted,
            status_message: None,
            artifacts: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refresh the mutation timestamp
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Text of the final answer: the last artifact's joined text
    pub fn final_text(&self) -> Option<String> {
        self.artifacts.last().map(Artifact::joined_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_submitted() {
        let task = Task::new("conv-1");
        assert_eq!(task.state, TaskState::Submitted);
        assert_eq!(task.context_id, "conv-1");
        assert!(task.artifacts.is_empty());
        assert!(task.status_message.is_none());
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = Task::new("conv-1");
        let b = Task::new("conv-1");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_final_text_uses_last_artifact() {
        let mut task = Task::new("conv-1");
        assert_eq!(task.final_text(), None);

        task.artifacts.push(Artifact::text("partial", "draft"));
        task.artifacts.push(Artifact::text("medical_response", "final answer"));
        assert_eq!(task.final_text(), Some("final answer".to_string()));
    }
}

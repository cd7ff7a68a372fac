//! Executors
//!
//! An executor drives one task to exactly one terminal state per invocation.
//! Failures occurring after the task exists are recorded as a `failed`
//! transition, never raised to the caller; cancellation either transitions
//! the task to `cancelled` or fails with the distinct `UnsupportedOperation`
//! error so callers can tell the two apart.

pub mod direct;
pub mod dispatch;
pub mod multistep;

pub use direct::RouterExecutor;
pub use dispatch::DispatchingExecutor;
pub use multistep::MultiStepExecutor;

use crate::error::HubResult;
use crate::task::TaskUpdater;
use async_trait::async_trait;
use std::collections::HashMap;

/// Metadata key selecting the orchestrator strategy for a request
pub const ORCHESTRATOR_MODE_KEY: &str = "orchestrator_mode";

/// Per-request context handed to executors
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub query: String,
    pub task_id: String,
    pub context_id: String,
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(
        query: impl Into<String>,
        task_id: impl Into<String>,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            task_id: task_id.into(),
            context_id: context_id.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Requested orchestrator mode, if any
    pub fn orchestrator_mode(&self) -> Option<&str> {
        self.metadata.get(ORCHESTRATOR_MODE_KEY).map(String::as_str)
    }
}

/// Strategy interface for handling one routed query
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Drive the task to a terminal state
    async fn execute(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()>;

    /// Cancel the in-flight task, or fail with `UnsupportedOperation`
    async fn cancel(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()>;
}

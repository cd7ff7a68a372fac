//! Dispatching executor
//!
//! Selects the routing strategy per request from the `orchestrator_mode`
//! metadata flag: `simple` (the default, also used for unrecognized values)
//! or `react` for the multi-step orchestrator. The dispatcher records which
//! strategy is executing each task so cancellation reaches the strategy
//! actually in flight, falling back to the direct strategy only when no
//! record exists for the task id.

use crate::error::HubResult;
use crate::executor::{AgentExecutor, RequestContext};
use crate::task::TaskUpdater;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Strategy selected for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Simple,
    MultiStep,
}

impl Mode {
    fn from_context(ctx: &RequestContext) -> Self {
        match ctx.orchestrator_mode() {
            Some("react") => Mode::MultiStep,
            _ => Mode::Simple,
        }
    }
}

/// Executor dispatching between the direct and multi-step strategies
pub struct DispatchingExecutor {
    simple: Arc<dyn AgentExecutor>,
    multi_step: Arc<dyn AgentExecutor>,
    in_flight: RwLock<HashMap<String, Mode>>,
}

impl DispatchingExecutor {
    pub fn new(simple: Arc<dyn AgentExecutor>, multi_step: Arc<dyn AgentExecutor>) -> Self {
        Self {
            simple,
            multi_step,
            in_flight: RwLock::new(HashMap::new()),
        }
    }

    fn strategy(&self, mode: Mode) -> &Arc<dyn AgentExecutor> {
        match mode {
            Mode::Simple => &self.simple,
            Mode::MultiStep => &self.multi_step,
        }
    }
}

#[async_trait]
impl AgentExecutor for DispatchingExecutor {
    async fn execute(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        let mode = Mode::from_context(ctx);
        debug!(task_id = %ctx.task_id, mode = ?mode, "Dispatching request");

        {
            let mut in_flight = self.in_flight.write().await;
            in_flight.insert(ctx.task_id.clone(), mode);
        }

        let result = self.strategy(mode).execute(ctx, updater).await;

        {
            let mut in_flight = self.in_flight.write().await;
            in_flight.remove(&ctx.task_id);
        }

        result
    }

    async fn cancel(&self, ctx: &RequestContext, updater: &TaskUpdater) -> HubResult<()> {
        let mode = {
            let in_flight = self.in_flight.read().await;
            in_flight.get(&ctx.task_id).copied()
        };

        // No record means the task never started or already finished; the
        // direct strategy's cancel is the safe default
        let mode = mode.unwrap_or(Mode::Simple);
        debug!(task_id = %ctx.task_id, mode = ?mode, "Dispatching cancellation");

        self.strategy(mode).cancel(ctx, updater).await
    }
}

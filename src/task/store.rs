//! Task store
//!
//! Keyed by task id. The in-memory implementation also hands out per-id
//! mutexes so callers can guarantee that two relay loops never mutate the
//! same task concurrently.

use crate::error::{HubError, HubResult};
use crate::task::Task;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Persistence seam for tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> HubResult<()>;
    async fn get(&self, id: &str) -> HubResult<Task>;
    async fn save(&self, task: &Task) -> HubResult<()>;

    /// Per-id mutex guaranteeing exclusive mutation of one task
    async fn lock(&self, id: &str) -> Arc<Mutex<()>>;
}

/// In-memory task store
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> HubResult<()> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get(&self, id: &str) -> HubResult<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(id).cloned().ok_or_else(|| HubError::TaskNotFound {
            task_id: id.to_string(),
        })
    }

    async fn save(&self, task: &Task) -> HubResult<()> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

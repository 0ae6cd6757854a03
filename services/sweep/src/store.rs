//! The task/proof store boundary. Owned
//! externally; the engine only reads tasks and writes proof updates.

use async_trait::async_trait;
use starlight_types::{Task, TaskProof};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Selects which tasks the periodic sweep job should consider.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub confirmed_not_swept: bool,
    pub contract_id: Option<String>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SweepStore: Send + Sync {
    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>>;
    async fn update_task_proof(&self, task_id: &str, proof: TaskProof) -> Result<()>;
    async fn update_contract_status(&self, contract_id: &str, status: &str) -> Result<()>;
}

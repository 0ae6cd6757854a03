//! Minimal adapters for the ingestion/task stores. Persistent
//! storage is deliberately out of scope for the core engine, so this is
//! the simplest real adapter that satisfies the trait contracts
//! without inventing the external system's storage engine — one JSON
//! file per record under `Config::state_dir`, mirroring the block
//! directory's own flat-file convention. Production
//! deployments replace this with their real database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reconciliation::{CapabilityError, IngestionFilter, IngestionStore};
use starlight_types::{IngestionRecord, IngestionStatus, Task, TaskProof};
use sweep::{StoreError, SweepStore, TaskFilter};

type IngestionResult<T> = std::result::Result<T, CapabilityError>;
type SweepResult<T> = std::result::Result<T, StoreError>;

pub struct JsonFileIngestionStore {
    dir: PathBuf,
}

impl JsonFileIngestionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_all(&self) -> Vec<IngestionRecord> {
        let mut out = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else { return out };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(raw) = tokio::fs::read(entry.path()).await {
                if let Ok(record) = serde_json::from_slice::<IngestionRecord>(&raw) {
                    out.push(record);
                }
            }
        }
        out
    }
}

#[async_trait]
impl IngestionStore for JsonFileIngestionStore {
    async fn get(&self, key: &str) -> IngestionResult<IngestionRecord> {
        let raw = tokio::fs::read(self.record_path(key))
            .await
            .map_err(|_| CapabilityError::NotFound(key.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| CapabilityError::Unavailable(e.to_string()))
    }

    async fn list_recent(&self, filter: IngestionFilter, limit: usize) -> IngestionResult<Vec<IngestionRecord>> {
        let mut records = self.read_all().await;
        if let Some(status) = filter.status {
            records.retain(|r| r.status == status);
        }
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records.truncate(limit);
        Ok(records)
    }

    async fn update_metadata(&self, id: &str, metadata: BTreeMap<String, String>) -> IngestionResult<()> {
        let mut record = self.get(id).await?;
        record.metadata.extend(metadata);
        write_json(&self.record_path(id), &record).await.map_err(|e| CapabilityError::Unavailable(e.to_string()))
    }

    async fn update_status_with_note(&self, id: &str, status: IngestionStatus, note: &str) -> IngestionResult<()> {
        let mut record = self.get(id).await?;
        record.status = status;
        record.metadata.insert("status_note".to_string(), note.to_string());
        write_json(&self.record_path(id), &record).await.map_err(|e| CapabilityError::Unavailable(e.to_string()))
    }
}

pub struct JsonFileSweepStore {
    dir: PathBuf,
}

impl JsonFileSweepStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn task_path(&self, task_id: &str) -> PathBuf {
        self.dir.join(format!("{task_id}.json"))
    }

    fn contract_status_path(&self, contract_id: &str) -> PathBuf {
        self.dir.join(format!("contract_{contract_id}.status"))
    }
}

#[async_trait]
impl SweepStore for JsonFileSweepStore {
    async fn list_tasks(&self, filter: TaskFilter) -> SweepResult<Vec<Task>> {
        let mut out = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else { return Ok(out) };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = tokio::fs::read(entry.path()).await else { continue };
            let Ok(task) = serde_json::from_slice::<Task>(&raw) else { continue };
            if let Some(contract_id) = &filter.contract_id {
                if &task.contract_id != contract_id {
                    continue;
                }
            }
            if filter.confirmed_not_swept {
                let keep = task.proof.as_ref().is_some_and(|p| p.is_confirmed() && !p.sweep_status.is_terminal());
                if !keep {
                    continue;
                }
            }
            out.push(task);
        }
        Ok(out)
    }

    async fn update_task_proof(&self, task_id: &str, proof: TaskProof) -> SweepResult<()> {
        let path = self.task_path(task_id);
        let raw = tokio::fs::read(&path).await.map_err(|_| StoreError::NotFound(task_id.to_string()))?;
        let mut task: Task = serde_json::from_slice(&raw).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        task.proof = Some(proof);
        write_json(&path, &task).await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn update_contract_status(&self, contract_id: &str, status: &str) -> SweepResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tokio::fs::write(self.contract_status_path(contract_id), status).await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(value)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    #[tokio::test]
    async fn update_metadata_merges_into_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIngestionStore::new(dir.path());
        let record = IngestionRecord { id: "r1".into(), filename: "f.png".into(), image_base64: String::new(), status: IngestionStatus::Pending, metadata: Map::new() };
        write_json(&store.record_path("r1"), &record).await.unwrap();

        let mut update = Map::new();
        update.insert("visible_pixel_hash".to_string(), "abc123".to_string());
        store.update_metadata("r1", update).await.unwrap();

        let reloaded = store.get("r1").await.unwrap();
        assert_eq!(reloaded.meta("visible_pixel_hash"), Some("abc123"));
    }

    #[tokio::test]
    async fn list_recent_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileIngestionStore::new(dir.path());
        for (id, status) in [("a", IngestionStatus::Pending), ("b", IngestionStatus::Confirmed)] {
            let record = IngestionRecord { id: id.into(), filename: "f.png".into(), image_base64: String::new(), status, metadata: Map::new() };
            write_json(&store.record_path(id), &record).await.unwrap();
        }

        let confirmed = store.list_recent(IngestionFilter { status: Some(IngestionStatus::Confirmed) }, 10).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "b");
    }
}

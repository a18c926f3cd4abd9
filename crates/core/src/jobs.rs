use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lifecycle of one upload. Transitions run strictly forward:
/// queued -> extracting -> chunking -> indexing -> completed, with `Error`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Extracting,
    Chunking,
    Indexing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: String,
    pub filename: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_count: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Process-lifetime registry of ingestion jobs. Cloning shares the map;
/// records are written whole under the lock so readers never see a
/// half-updated job.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<String, IngestionJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, filename: &str) -> IngestionJob {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let job = IngestionJob {
            id: format!("job_{}", &suffix[..12]),
            filename: filename.to_string(),
            status: JobStatus::Queued,
            error: None,
            fragment_count: None,
            created_at: now,
            updated_at: now,
        };

        self.inner.write().await.insert(job.id.clone(), job.clone());
        job
    }

    pub async fn get(&self, id: &str) -> Option<IngestionJob> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn advance(&self, id: &str, status: JobStatus) {
        if let Some(job) = self.inner.write().await.get_mut(id) {
            job.status = status;
            job.updated_at = Utc::now();
        }
    }

    pub async fn complete(&self, id: &str, fragment_count: usize) {
        if let Some(job) = self.inner.write().await.get_mut(id) {
            job.status = JobStatus::Completed;
            job.fragment_count = Some(fragment_count);
            job.updated_at = Utc::now();
        }
    }

    pub async fn fail(&self, id: &str, message: impl Into<String>) {
        if let Some(job) = self.inner.write().await.get_mut(id) {
            job.status = JobStatus::Error;
            job.error = Some(message.into());
            job.updated_at = Utc::now();
        }
    }
}

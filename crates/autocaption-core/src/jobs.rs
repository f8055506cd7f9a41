//! In-memory registry of asynchronous caption jobs.
//!
//! Records live only for the life of the process. The registry holds at most
//! `max_records` entries; when full, the oldest finished record is evicted.
//! Queued and running jobs are never evicted.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AutocaptionError;

/// Lifecycle of a caption job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed {
        caption: String,
        hashtags: Vec<String>,
        scheduled_at: DateTime<chrono::Local>,
    },
    Failed {
        /// Machine-readable error code
        kind: String,
        message: String,
    },
}

impl JobStatus {
    pub fn failed(error: &AutocaptionError) -> Self {
        JobStatus::Failed {
            kind: error.code().to_string(),
            message: error.to_string(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

/// A caption job as reported to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub status: JobStatus,
    pub file_name: String,
    pub image_url: String,
    pub length: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Registry {
    records: HashMap<Uuid, JobRecord>,
    order: VecDeque<Uuid>,
}

/// Shared job registry.
pub struct CaptionJobs {
    inner: RwLock<Registry>,
    max_records: usize,
}

impl CaptionJobs {
    pub fn new(max_records: usize) -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
            max_records: max_records.max(1),
        }
    }

    /// Register a new queued job and return its id.
    pub async fn create(&self, file_name: &str, image_url: &str, length: u32) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let record = JobRecord {
            id,
            status: JobStatus::Queued,
            file_name: file_name.to_string(),
            image_url: image_url.to_string(),
            length,
            created_at: now,
            updated_at: now,
        };

        let mut registry = self.inner.write().await;
        if registry.records.len() >= self.max_records {
            evict_oldest_finished(&mut registry);
        }
        registry.records.insert(id, record);
        registry.order.push_back(id);

        tracing::debug!(job_id = %id, file = file_name, "Caption job queued");
        id
    }

    /// Move a job to a new status. Unknown ids are ignored.
    pub async fn update(&self, id: Uuid, status: JobStatus) {
        let mut registry = self.inner.write().await;
        if let Some(record) = registry.records.get_mut(&id) {
            record.status = status;
            record.updated_at = Utc::now();
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.inner.read().await.records.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn evict_oldest_finished(registry: &mut Registry) {
    let position = registry.order.iter().position(|id| {
        registry
            .records
            .get(id)
            .is_some_and(|record| record.status.is_finished())
    });

    if let Some(position) = position {
        if let Some(id) = registry.order.remove(position) {
            registry.records.remove(&id);
            tracing::trace!(job_id = %id, "Evicted finished caption job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaptionError;

    fn completed(caption: &str) -> JobStatus {
        JobStatus::Completed {
            caption: caption.to_string(),
            hashtags: vec![],
            scheduled_at: chrono::Local::now(),
        }
    }

    #[tokio::test]
    async fn test_create_then_complete() {
        let jobs = CaptionJobs::new(10);
        let id = jobs.create("cat.jpg", "/uploads/cat.jpg", 80).await;

        let record = jobs.get(id).await.unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.length, 80);

        jobs.update(id, JobStatus::Running).await;
        jobs.update(id, completed("a cat")).await;

        let record = jobs.get(id).await.unwrap();
        assert!(record.status.is_finished());
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let jobs = CaptionJobs::new(10);
        assert!(jobs.get(Uuid::new_v4()).await.is_none());
        jobs.update(Uuid::new_v4(), JobStatus::Running).await;
        assert!(jobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_evicts_oldest_finished_first() {
        let jobs = CaptionJobs::new(3);
        let running = jobs.create("a.jpg", "/uploads/a.jpg", 80).await;
        let done_old = jobs.create("b.jpg", "/uploads/b.jpg", 80).await;
        let done_new = jobs.create("c.jpg", "/uploads/c.jpg", 80).await;

        jobs.update(running, JobStatus::Running).await;
        jobs.update(done_old, completed("b")).await;
        jobs.update(done_new, completed("c")).await;

        let fresh = jobs.create("d.jpg", "/uploads/d.jpg", 80).await;

        assert_eq!(jobs.len().await, 3);
        assert!(jobs.get(running).await.is_some());
        assert!(jobs.get(done_old).await.is_none());
        assert!(jobs.get(done_new).await.is_some());
        assert!(jobs.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_active_jobs_never_evicted() {
        let jobs = CaptionJobs::new(1);
        let first = jobs.create("a.jpg", "/uploads/a.jpg", 80).await;
        let second = jobs.create("b.jpg", "/uploads/b.jpg", 80).await;

        assert!(jobs.get(first).await.is_some());
        assert!(jobs.get(second).await.is_some());
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let failed = JobStatus::failed(&AutocaptionError::Caption(CaptionError::Inference {
            message: "backend down".to_string(),
            status_code: Some(503),
        }));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "inference_failed");

        let json = serde_json::to_value(JobStatus::Queued).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "queued" }));
    }

    #[tokio::test]
    async fn test_record_flattens_status() {
        let jobs = CaptionJobs::new(10);
        let id = jobs.create("cat.jpg", "/uploads/cat.jpg", 40).await;
        jobs.update(id, completed("a cat")).await;

        let json = serde_json::to_value(jobs.get(id).await.unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["caption"], "a cat");
        assert_eq!(json["file_name"], "cat.jpg");
    }
}

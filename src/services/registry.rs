use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::{GenerationOptions, JobRecord};

/// Shared handle to one job record. Only the runner that owns the job writes to it.
pub type JobHandle = Arc<RwLock<JobRecord>>;

/// How many completed jobs are kept, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_completed_jobs: usize,
    pub completed_ttl: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_completed_jobs: 100,
            completed_ttl: Duration::from_secs(3600),
        }
    }
}

struct JobEntry {
    record: JobHandle,
    cancel: CancellationToken,
}

/// In-memory store of batch jobs, bounded by a [`RetentionPolicy`].
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, JobEntry>>,
    retention: RetentionPolicy,
    shutdown: CancellationToken,
}

impl JobRegistry {
    /// `shutdown` is the parent of every job's cancellation token.
    pub fn new(retention: RetentionPolicy, shutdown: CancellationToken) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
            shutdown,
        }
    }

    /// Allocate and store a fresh `Started` job.
    pub async fn create(
        &self,
        total_items: usize,
        options: GenerationOptions,
    ) -> (JobHandle, CancellationToken) {
        let record = JobRecord::new(total_items, options);
        let id = record.id;
        let handle = Arc::new(RwLock::new(record));
        let cancel = self.shutdown.child_token();

        self.jobs.write().await.insert(
            id,
            JobEntry {
                record: handle.clone(),
                cancel: cancel.clone(),
            },
        );
        metrics::gauge!("image_jobs_tracked").increment(1.0);

        (handle, cancel)
    }

    pub async fn get(&self, id: &Uuid) -> Option<JobHandle> {
        self.jobs.read().await.get(id).map(|e| e.record.clone())
    }

    /// Signal the job's runner to stop. Returns false for unknown ids.
    pub async fn cancel(&self, id: &Uuid) -> bool {
        match self.jobs.read().await.get(id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Evict completed jobs older than the TTL, then the oldest completed jobs
    /// beyond the retention cap. Jobs still running are never evicted.
    ///
    /// Returns the number of jobs removed.
    pub async fn reap(&self, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(self.retention.completed_ttl)
            .unwrap_or(chrono::Duration::MAX);

        let mut completed: Vec<(Uuid, DateTime<Utc>)> = Vec::new();
        {
            let jobs = self.jobs.read().await;
            for (id, entry) in jobs.iter() {
                let record = entry.record.read().await;
                if let Some(completed_at) = record.completed_at {
                    completed.push((*id, completed_at));
                }
            }
        }

        // Oldest first.
        completed.sort_by_key(|(_, at)| *at);

        let mut evict: Vec<Uuid> = Vec::new();
        let mut kept: Vec<Uuid> = Vec::new();
        for (id, completed_at) in completed {
            if now.signed_duration_since(completed_at) > ttl {
                evict.push(id);
            } else {
                kept.push(id);
            }
        }
        let overflow = kept.len().saturating_sub(self.retention.max_completed_jobs);
        evict.extend(kept.into_iter().take(overflow));

        if evict.is_empty() {
            return 0;
        }

        let mut jobs = self.jobs.write().await;
        let mut removed = 0;
        for id in evict {
            if jobs.remove(&id).is_some() {
                removed += 1;
            }
        }
        metrics::gauge!("image_jobs_tracked").decrement(removed as f64);
        removed
    }
}

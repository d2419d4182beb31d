use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::services::{
    providers::ProviderSet,
    registry::{JobRegistry, RetentionPolicy},
    runner::BatchRunner,
    storage::{ImageStore, StorageError},
};

/// Shared state passed to every tool handler.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobRegistry>,
    pub runner: Arc<BatchRunner>,
    pub storage: Arc<ImageStore>,
    pub providers: ProviderSet,
    /// Cancelled when the process is shutting down; parent of every job token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        providers: ProviderSet,
        storage: ImageStore,
        retention: RetentionPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        let storage = Arc::new(storage);
        Self {
            jobs: Arc::new(JobRegistry::new(retention, shutdown.clone())),
            runner: Arc::new(BatchRunner::new(providers.clone(), storage.clone())),
            storage,
            providers,
            shutdown,
        }
    }

    /// Build the production state: both HTTP providers and the configured output directory.
    pub async fn from_config(
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, StorageError> {
        let storage = ImageStore::open(&config.output_dir).await?;
        let retention = RetentionPolicy {
            max_completed_jobs: config.max_retained_jobs,
            completed_ttl: config.job_retention(),
        };
        Ok(Self::new(
            ProviderSet::from_config(config),
            storage,
            retention,
            shutdown,
        ))
    }
}

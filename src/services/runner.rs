use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::job::{GenerationOptions, ItemResult};
use crate::services::prompt::{build_prompt, sanitize_filename};
use crate::services::providers::{ImageProvider, ProviderError, ProviderSet, SynthesisRequest};
use crate::services::registry::JobHandle;
use crate::services::storage::{ImageStore, StorageError};

/// Why a single item failed. Never escapes the runner; it becomes a failed [`ItemResult`].
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Provider call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Provider returned data that is not a recognised image")]
    NotAnImage,

    #[error("Failed to save image: {0}")]
    Storage(#[from] StorageError),

    #[error("Job cancelled")]
    Cancelled,
}

/// Drives a job through its word list, one provider call per word.
pub struct BatchRunner {
    providers: ProviderSet,
    storage: Arc<ImageStore>,
}

impl BatchRunner {
    pub fn new(providers: ProviderSet, storage: Arc<ImageStore>) -> Self {
        Self { providers, storage }
    }

    /// Process every word in order, recording exactly one result per word.
    ///
    /// Per-item failures are recorded and the batch moves on. When `cancel`
    /// fires, the in-flight call is dropped and the remaining words are
    /// recorded as cancelled without calling the provider.
    pub async fn run(&self, job: JobHandle, words: Vec<String>, cancel: CancellationToken) {
        let (job_id, options) = {
            let record = job.read().await;
            (record.id, record.options.clone())
        };

        let provider = match self.providers.get(options.provider) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(job_id = %job_id, provider = %options.provider, error = %e, "Provider unavailable");
                None
            }
        };

        // Millis plus a job-id fragment keeps same-millisecond jobs apart.
        let batch_stamp = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            &job_id.simple().to_string()[..8]
        );
        let mut seen: HashMap<String, usize> = HashMap::new();
        let started = Instant::now();
        metrics::gauge!("image_jobs_active").increment(1.0);

        info!(
            job_id = %job_id,
            provider = %options.provider,
            style = %options.style,
            total = words.len(),
            "Starting batch"
        );

        for word in &words {
            job.write().await.begin_item(word);

            let stem = sanitize_filename(word);
            let occurrence = seen.entry(stem.clone()).or_insert(0);
            *occurrence += 1;
            let base_name = if *occurrence > 1 {
                format!("{stem}_{batch_stamp}-{occurrence}")
            } else {
                format!("{stem}_{batch_stamp}")
            };

            let item_start = Instant::now();
            let outcome = match &provider {
                Some(provider) if !cancel.is_cancelled() => {
                    self.generate_one(provider.as_ref(), word, &base_name, &options, &cancel)
                        .await
                }
                Some(_) => Err(ItemError::Cancelled),
                None => Err(ProviderError::Unavailable(options.provider).into()),
            };
            metrics::histogram!("image_item_seconds").record(item_start.elapsed().as_secs_f64());

            let result = match outcome {
                Ok(result) => {
                    metrics::counter!("image_items_succeeded_total").increment(1);
                    debug!(job_id = %job_id, word = %word, location = ?result.location, "Item generated");
                    result
                }
                Err(e) => {
                    metrics::counter!("image_items_failed_total").increment(1);
                    warn!(job_id = %job_id, word = %word, error = %e, "Item failed");
                    ItemResult::failed(word.as_str(), e.to_string())
                }
            };

            job.write().await.record(result);
        }

        metrics::gauge!("image_jobs_active").decrement(1.0);

        let record = job.read().await;
        info!(
            job_id = %job_id,
            succeeded = record.success_count(),
            failed = record.results.len() - record.success_count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch complete"
        );
    }

    async fn generate_one(
        &self,
        provider: &dyn ImageProvider,
        word: &str,
        base_name: &str,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<ItemResult, ItemError> {
        let prompt = build_prompt(word, options.style, &options.background);
        let request = SynthesisRequest {
            prompt: prompt.clone(),
            width: options.width,
            height: options.height,
            quality: options.quality.clone(),
        };

        let budget = provider.timeout();
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(ItemError::Cancelled),
            outcome = tokio::time::timeout(budget, provider.synthesize(&request)) => {
                outcome.map_err(|_| ItemError::Timeout(budget))??
            }
        };

        let format = image::guess_format(&bytes).map_err(|_| ItemError::NotAnImage)?;
        let extension = format.extensions_str().first().copied().unwrap_or("png");
        let filename = format!("{base_name}.{extension}");
        let path = self.storage.save(&filename, &bytes).await?;

        Ok(ItemResult::succeeded(
            word,
            path.display().to_string(),
            prompt,
            options.width,
            options.height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use crate::models::style::Style;
    use crate::services::providers::ProviderKind;
    use crate::services::registry::{JobRegistry, RetentionPolicy};
    use async_trait::async_trait;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    struct SlowProvider;

    #[async_trait]
    impl ImageProvider for SlowProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Dalle
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(20)
        }

        async fn synthesize(&self, _: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PNG.to_vec())
        }
    }

    struct TextProvider;

    #[async_trait]
    impl ImageProvider for TextProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Dalle
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn synthesize(&self, _: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
            Ok(b"not an image".to_vec())
        }
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            provider: ProviderKind::Dalle,
            style: Style::Cartoon,
            background: "white".to_string(),
            width: 256,
            height: 256,
            quality: "standard".to_string(),
        }
    }

    async fn run_with(provider: Arc<dyn ImageProvider>, words: &[&str]) -> Vec<ItemResult> {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ImageStore::open(dir.path()).await.unwrap());
        let runner = BatchRunner::new(ProviderSet::new().with(provider), storage);
        let registry = JobRegistry::new(RetentionPolicy::default(), CancellationToken::new());
        let (job, cancel) = registry.create(words.len(), options()).await;
        let words = words.iter().map(|w| w.to_string()).collect();
        runner.run(job.clone(), words, cancel).await;
        let record = job.read().await;
        assert_eq!(record.status, JobStatus::Completed);
        record.results.clone()
    }

    #[tokio::test]
    async fn test_timeout_becomes_failed_item() {
        let results = run_with(Arc::new(SlowProvider), &["cat"]).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert_eq!(
            results[0].error.as_deref(),
            Some("Provider call timed out after 20ms")
        );
    }

    #[tokio::test]
    async fn test_non_image_payload_is_rejected() {
        let results = run_with(Arc::new(TextProvider), &["cat", "dog"]).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_success()));
        assert!(results[0].error.as_deref().unwrap().contains("not a recognised image"));
    }

    #[tokio::test]
    async fn test_unregistered_provider_fails_every_item() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ImageStore::open(dir.path()).await.unwrap());
        let runner = BatchRunner::new(ProviderSet::new(), storage);
        let registry = JobRegistry::new(RetentionPolicy::default(), CancellationToken::new());
        let (job, cancel) = registry.create(2, options()).await;
        runner
            .run(job.clone(), vec!["a".into(), "b".into()], cancel)
            .await;
        let record = job.read().await;
        assert_eq!(record.completed_items, 2);
        assert!(record.results.iter().all(|r| !r.is_success()));
    }

    #[tokio::test]
    async fn test_cancel_records_remaining_items() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ImageStore::open(dir.path()).await.unwrap());
        let runner = BatchRunner::new(ProviderSet::new().with(Arc::new(SlowProvider)), storage);
        let registry = JobRegistry::new(RetentionPolicy::default(), CancellationToken::new());
        let (job, cancel) = registry.create(3, options()).await;
        cancel.cancel();
        runner
            .run(job.clone(), vec!["a".into(), "b".into(), "c".into()], cancel)
            .await;
        let record = job.read().await;
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.results.len(), 3);
        assert!(record
            .results
            .iter()
            .all(|r| r.error.as_deref() == Some("Job cancelled")));
    }
}

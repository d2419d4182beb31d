use garde::Validate;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{parse_args, to_value, ToolError};
use crate::app_state::AppState;
use crate::models::job::{GenerationOptions, JobRecord, JobStatus};
use crate::models::style::Style;
use crate::models::tool::{BatchResponse, GenerateRequest, GenerateResponse};
use crate::services::providers::ProviderKind;

/// Upper bound on words in one batch.
const MAX_WORDS: usize = 100;

/// `generate_images`: start a batch job, or run it to completion when `async` is false.
pub async fn generate_images(state: &AppState, args: Value) -> Result<Value, ToolError> {
    let request: GenerateRequest = parse_args(args)?;
    request.validate()?;

    let words = request.word_list();
    if words.is_empty() {
        return Err(ToolError::Validation(
            "no usable words after splitting on commas".to_string(),
        ));
    }
    if words.len() > MAX_WORDS {
        return Err(ToolError::Validation(format!(
            "{} words requested, at most {MAX_WORDS} per batch",
            words.len()
        )));
    }

    let provider = ProviderKind::from_str(request.provider.trim()).map_err(|_| {
        ToolError::Validation(format!(
            "unknown provider '{}', expected dalle or stability",
            request.provider
        ))
    })?;
    state
        .providers
        .get(provider)
        .map_err(|e| ToolError::Configuration(e.to_string()))?;

    let (width, height) = request
        .dimensions()
        .ok_or_else(|| ToolError::Validation(format!("size '{}' is not WxH", request.size)))?;

    let options = GenerationOptions {
        provider,
        style: Style::resolve(request.style.as_deref()),
        background: request.background.trim().to_string(),
        width,
        height,
        quality: request.quality.trim().to_ascii_lowercase(),
    };
    let total_items = words.len();
    metrics::counter!("image_jobs_total").increment(1);

    if request.run_async {
        let (job, cancel) = state.jobs.create(total_items, options).await;
        let job_id = job.read().await.id;
        tracing::info!(job_id = %job_id, provider = %provider, total_items, "Job created");

        let runner = state.runner.clone();
        tokio::spawn(async move {
            runner.run(job, words, cancel).await;
        });

        return to_value(&GenerateResponse {
            job_id,
            status: JobStatus::Started,
            message: format!(
                "Generating {total_items} image(s) in the background. Use check_status with this job id to follow progress."
            ),
            total_items,
        });
    }

    // Same runner, but on a record that never enters the registry.
    let job = Arc::new(RwLock::new(JobRecord::new(total_items, options)));
    state
        .runner
        .run(job.clone(), words, state.shutdown.child_token())
        .await;

    let record = job.read().await;
    let success_count = record.success_count();
    to_value(&BatchResponse {
        total_items,
        success_count,
        failure_count: record.results.len() - success_count,
        results: record.results.clone(),
    })
}

//! Shared test utilities: scripted providers and ready-made app state.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use word_image_gen::{
    app_state::AppState,
    models::{job::JobStatus, tool::StatusView},
    services::{
        providers::{ImageProvider, ProviderError, ProviderKind, ProviderSet, SynthesisRequest},
        registry::RetentionPolicy,
        storage::ImageStore,
    },
    tools,
};

use crate::fixtures;

/// Provider returning a fixed PNG, failing for chosen words.
pub struct MockProvider {
    kind: ProviderKind,
    fail_on: HashSet<String>,
    delay: Duration,
    payload: Vec<u8>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            fail_on: HashSet::new(),
            delay: Duration::ZERO,
            payload: fixtures::png_bytes(8, 8),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, words: &[&str]) -> Self {
        self.fail_on = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Prompts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
        self.calls.lock().unwrap().push(request.prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let fails = self
            .fail_on
            .iter()
            .any(|w| request.prompt.contains(&format!("\"{w}\"")));
        if fails {
            return Err(ProviderError::Http {
                provider: self.kind,
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(self.payload.clone())
    }
}

/// App state over a temp output dir; keep the `TempDir` alive for the test.
pub async fn test_state(providers: ProviderSet) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let storage = ImageStore::open(dir.path()).await.expect("open store");
    let state = AppState::new(
        providers,
        storage,
        RetentionPolicy::default(),
        CancellationToken::new(),
    );
    (state, dir)
}

pub async fn state_with(provider: Arc<MockProvider>) -> (AppState, TempDir) {
    test_state(ProviderSet::new().with(provider)).await
}

/// Call a tool and unwrap a successful result.
pub async fn call_ok(state: &AppState, tool: &str, args: Value) -> Value {
    tools::call(state, tool, args)
        .await
        .unwrap_or_else(|e| panic!("{tool} failed: {e}"))
}

pub async fn start_job(state: &AppState, words: &str, provider: &str) -> Uuid {
    let resp = call_ok(
        state,
        tools::GENERATE_IMAGES,
        json!({ "words": words, "provider": provider, "size": "256x256" }),
    )
    .await;
    let id = resp["jobId"].as_str().expect("jobId in response");
    Uuid::parse_str(id).expect("jobId is a UUID")
}

pub async fn status(state: &AppState, job_id: Uuid) -> StatusView {
    let value = call_ok(
        state,
        tools::CHECK_STATUS,
        json!({ "jobId": job_id.to_string() }),
    )
    .await;
    serde_json::from_value(value).expect("status view")
}

/// Poll `check_status` until the job completes.
pub async fn wait_for_completion(state: &AppState, job_id: Uuid) -> StatusView {
    for _ in 0..500 {
        let view = status(state, job_id).await;
        if view.status == JobStatus::Completed {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not complete in time");
}

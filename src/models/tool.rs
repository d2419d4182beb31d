use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{GenerationOptions, ItemResult, JobStatus};

fn default_provider() -> String {
    "dalle".to_string()
}

fn default_background() -> String {
    "white".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_async() -> bool {
    true
}

/// Arguments of the `generate_images` tool.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Comma-separated words, one image each.
    #[garde(length(min = 1, max = 4000))]
    pub words: String,

    #[serde(default = "default_provider")]
    #[garde(length(min = 1, max = 32))]
    pub provider: String,

    #[serde(default)]
    #[garde(length(max = 32))]
    pub style: Option<String>,

    #[serde(default = "default_background")]
    #[garde(length(min = 1, max = 200))]
    pub background: String,

    #[serde(default = "default_size")]
    #[garde(length(min = 3, max = 16))]
    pub size: String,

    #[serde(default = "default_quality")]
    #[garde(length(min = 1, max = 32))]
    pub quality: String,

    /// Return a job handle immediately instead of waiting for the batch.
    #[serde(rename = "async", default = "default_async")]
    #[garde(skip)]
    pub run_async: bool,
}

impl GenerateRequest {
    /// Split the word list on commas, trimming blanks away.
    pub fn word_list(&self) -> Vec<String> {
        self.words
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parse `size` ("WxH", 2 to 5 digits per side) into a width/height pair.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.size.trim().split_once(['x', 'X'])?;
        let side = |s: &str| {
            let s = s.trim();
            let digits = (2..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
            digits.then(|| s.parse::<u32>().ok()).flatten()
        };
        let (width, height) = (side(w)?, side(h)?);
        (width > 0 && height > 0).then_some((width, height))
    }
}

/// Response of an asynchronous `generate_images` call.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
    pub total_items: usize,
}

/// Response of a synchronous (`async = false`) `generate_images` call.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub total_items: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<ItemResult>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[garde(length(min = 1, max = 64))]
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Read-only view of a job; results only appear once the job is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub options: GenerationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ItemResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListRequest {
    #[serde(default)]
    #[garde(length(max = 200))]
    pub pattern: Option<String>,
}

/// Metadata for one file in the output directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub count: usize,
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteRequest {
    #[garde(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::style::Style;
use crate::services::providers::ProviderKind;

/// Lifecycle of a batch generation job. Only ever moves forward.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Started,
    Generating,
    Completed,
}

/// Generation parameters fixed when the job is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub provider: ProviderKind,
    pub style: Style,
    pub background: String,
    pub width: u32,
    pub height: u32,
    pub quality: String,
}

impl GenerationOptions {
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Outcome for one word of a batch. Failures carry no location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub source_word: String,
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    pub fn succeeded(
        source_word: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            source_word: source_word.into(),
            location: Some(location.into()),
            description: Some(description.into()),
            width: Some(width),
            height: Some(height),
            error: None,
        }
    }

    pub fn failed(source_word: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_word: source_word.into(),
            location: None,
            description: None,
            width: None,
            height: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// In-memory record of one batch job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub total_items: usize,
    pub completed_items: usize,
    pub current_item: Option<String>,
    pub results: Vec<ItemResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub options: GenerationOptions,
}

impl JobRecord {
    pub fn new(total_items: usize, options: GenerationOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Started,
            total_items,
            completed_items: 0,
            current_item: None,
            results: Vec::with_capacity(total_items),
            started_at: Utc::now(),
            completed_at: None,
            options,
        }
    }

    /// Mark `word` as the item in flight.
    pub fn begin_item(&mut self, word: &str) {
        self.status = JobStatus::Generating;
        self.current_item = Some(word.to_string());
    }

    /// Append one outcome and advance the counters in a single step.
    ///
    /// The job completes when the last expected result lands; extra results
    /// beyond `total_items` are ignored so the record never overflows.
    pub fn record(&mut self, result: ItemResult) {
        if self.status == JobStatus::Completed {
            return;
        }
        self.results.push(result);
        self.completed_items = self.results.len();
        if self.completed_items >= self.total_items {
            self.status = JobStatus::Completed;
            self.current_item = None;
            self.completed_at = Some(Utc::now());
        } else {
            self.status = JobStatus::Generating;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GenerationOptions {
        GenerationOptions {
            provider: ProviderKind::Dalle,
            style: Style::Cartoon,
            background: "white".to_string(),
            width: 512,
            height: 512,
            quality: "standard".to_string(),
        }
    }

    #[test]
    fn test_new_record_is_started() {
        let job = JobRecord::new(2, options());
        assert_eq!(job.status, JobStatus::Started);
        assert_eq!(job.completed_items, 0);
        assert!(job.current_item.is_none());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_record_advances_and_completes() {
        let mut job = JobRecord::new(2, options());
        job.begin_item("cat");
        assert_eq!(job.status, JobStatus::Generating);
        assert_eq!(job.current_item.as_deref(), Some("cat"));

        job.record(ItemResult::succeeded("cat", "/tmp/cat.png", "a cat", 512, 512));
        assert_eq!(job.status, JobStatus::Generating);
        assert_eq!(job.completed_items, 1);

        job.begin_item("dog");
        job.record(ItemResult::failed("dog", "boom"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_items, 2);
        assert!(job.current_item.is_none());
        assert!(job.completed_at.is_some());
        assert_eq!(job.success_count(), 1);
    }

    #[test]
    fn test_record_after_completion_is_ignored() {
        let mut job = JobRecord::new(1, options());
        job.record(ItemResult::failed("cat", "boom"));
        let completed_at = job.completed_at;
        job.record(ItemResult::failed("cat", "again"));
        assert_eq!(job.results.len(), 1);
        assert_eq!(job.completed_at, completed_at);
    }

    #[test]
    fn test_status_ordering_is_monotonic() {
        assert!(JobStatus::Started < JobStatus::Generating);
        assert!(JobStatus::Generating < JobStatus::Completed);
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_failed_item_has_no_location() {
        let item = ItemResult::failed("owl", "timeout");
        assert!(!item.is_success());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sourceWord"], "owl");
        assert!(json["location"].is_null());
        assert_eq!(json["error"], "timeout");
    }
}

//! The tools exposed over MCP and their dispatch.

pub mod generate;
pub mod images;
pub mod status;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::style::Style;
use crate::services::storage::StorageError;

pub const GENERATE_IMAGES: &str = "generate_images";
pub const CHECK_STATUS: &str = "check_status";
pub const LIST_IMAGES: &str = "list_images";
pub const DELETE_IMAGE: &str = "delete_image";

/// Failure of a tool call, reported to the caller as an error result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ToolError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => ToolError::NotFound(format!("image '{name}'")),
            StorageError::InvalidName(name) => {
                ToolError::Validation(format!("'{name}' is not a plain file name"))
            }
            other => ToolError::Storage(other),
        }
    }
}

impl From<garde::Report> for ToolError {
    fn from(report: garde::Report) -> Self {
        ToolError::Validation(report.to_string())
    }
}

/// Deserialize tool arguments, treating a missing object as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::Internal(format!("failed to encode response: {e}")))
}

/// Route a `tools/call` to its handler.
pub async fn call(state: &AppState, name: &str, args: Value) -> Result<Value, ToolError> {
    match name {
        GENERATE_IMAGES => generate::generate_images(state, args).await,
        CHECK_STATUS => status::check_status(state, args).await,
        LIST_IMAGES => images::list_images(state, args).await,
        DELETE_IMAGE => images::delete_image(state, args).await,
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Tool descriptors returned from `tools/list`.
pub fn definitions() -> Vec<Value> {
    vec![
        json!({
            "name": GENERATE_IMAGES,
            "description": "Generate one illustration per word. Returns a job id immediately unless async is false.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "words": { "type": "string", "description": "Comma-separated list of words" },
                    "provider": { "type": "string", "enum": ["dalle", "stability"], "default": "dalle" },
                    "style": { "type": "string", "enum": Style::names(), "default": Style::DEFAULT.to_string() },
                    "background": { "type": "string", "default": "white" },
                    "size": { "type": "string", "pattern": "^\\d+x\\d+$", "default": "1024x1024" },
                    "quality": { "type": "string", "enum": ["standard", "hd"], "default": "standard" },
                    "async": { "type": "boolean", "default": true }
                },
                "required": ["words"]
            }
        }),
        json!({
            "name": CHECK_STATUS,
            "description": "Report progress of a generation job; results are included once it completes.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "jobId": { "type": "string" }
                },
                "required": ["jobId"]
            }
        }),
        json!({
            "name": LIST_IMAGES,
            "description": "List generated images, newest first.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "pattern": { "type": "string", "description": "Case-insensitive substring of the file name" }
                }
            }
        }),
        json!({
            "name": DELETE_IMAGE,
            "description": "Delete one generated image by file name.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "filename": { "type": "string" }
                },
                "required": ["filename"]
            }
        }),
    ]
}

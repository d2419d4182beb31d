use garde::Validate;
use serde_json::Value;

use super::{parse_args, to_value, ToolError};
use crate::app_state::AppState;
use crate::models::tool::{DeleteRequest, DeleteResponse, ListRequest, ListResponse};

/// `list_images`: files in the output directory, newest first.
pub async fn list_images(state: &AppState, args: Value) -> Result<Value, ToolError> {
    let request: ListRequest = parse_args(args)?;
    request.validate()?;

    let images = state.storage.list(request.pattern.as_deref()).await?;
    to_value(&ListResponse {
        count: images.len(),
        images,
    })
}

/// `delete_image`: remove one file by name.
pub async fn delete_image(state: &AppState, args: Value) -> Result<Value, ToolError> {
    let request: DeleteRequest = parse_args(args)?;
    request.validate()?;

    let filename = request.filename.trim();
    state.storage.delete(filename).await?;
    tracing::info!(filename, "Image deleted");

    to_value(&DeleteResponse {
        success: true,
        message: format!("Deleted {filename}"),
    })
}

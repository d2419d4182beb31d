use garde::Validate;
use serde_json::Value;
use uuid::Uuid;

use super::{parse_args, to_value, ToolError};
use crate::app_state::AppState;
use crate::models::tool::StatusRequest;
use crate::services::reporter;

/// `check_status`: snapshot of one job.
pub async fn check_status(state: &AppState, args: Value) -> Result<Value, ToolError> {
    let request: StatusRequest = parse_args(args)?;
    request.validate()?;

    let not_found = || ToolError::NotFound(format!("job '{}'", request.job_id));
    let id = Uuid::parse_str(request.job_id.trim()).map_err(|_| not_found())?;
    let job = state.jobs.get(&id).await.ok_or_else(not_found)?;

    let view = reporter::report(&*job.read().await);
    to_value(&view)
}

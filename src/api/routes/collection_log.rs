use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::collection_log::{CollectionLog, LogSummary, DEFAULT_RECENT_ITEMS};
use crate::fetch::MANUAL_UPLOAD_USERNAME;

/// Either a username to fetch or an uploaded log document.
#[derive(Debug, Deserialize)]
pub struct CollectionLogRequest {
    pub username: Option<String>,

    pub log: Option<Value>,

    pub recent_limit: Option<usize>,
}

pub async fn import_collection_log(
    State(state): State<AppState>,
    Json(req): Json<CollectionLogRequest>,
) -> Result<Json<LogSummary>, ApiError> {
    let log = match (req.log, req.username) {
        (Some(document), _) => {
            let log = CollectionLog::from_value(&document)?;
            if log.username.is_empty() {
                log.with_username(MANUAL_UPLOAD_USERNAME)
            } else {
                log
            }
        }
        (None, Some(username)) => state.remote.fetch_user(&username).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either `username` or `log` is required".to_string(),
            ))
        }
    };

    info!(
        "Imported collection log for {} ({} obtained)",
        log.username,
        log.obtained_set().len()
    );

    Ok(Json(
        log.summary(req.recent_limit.unwrap_or(DEFAULT_RECENT_ITEMS)),
    ))
}

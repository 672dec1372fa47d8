use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::catalog::ReloadOutcome;
use crate::models::{Activity, ActivityIndex};

#[derive(Debug, Serialize)]
pub struct ActivitySummary {
    pub activity_index: ActivityIndex,
    pub activity_name: String,
    pub completions_per_hour_main: f64,
    pub completions_per_hour_iron: f64,
    pub extra_time_to_first_completion: f64,
    pub item_count: usize,
}

impl From<&Activity> for ActivitySummary {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_index: activity.activity_index,
            activity_name: activity.activity_name.clone(),
            completions_per_hour_main: activity.completions_per_hour_main,
            completions_per_hour_iron: activity.completions_per_hour_iron,
            extra_time_to_first_completion: activity.extra_time_to_first_completion,
            item_count: activity.drop_items().len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub total: usize,
    pub catalog_fingerprint: String,
}

pub async fn list_activities(State(state): State<AppState>) -> Json<ActivitiesResponse> {
    let catalog = state.catalog.snapshot().await;
    let activities: Vec<ActivitySummary> = catalog.activities().iter().map(Into::into).collect();
    Json(ActivitiesResponse {
        total: activities.len(),
        activities,
        catalog_fingerprint: catalog.fingerprint().to_string(),
    })
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(index): Path<ActivityIndex>,
) -> Result<Json<Activity>, ApiError> {
    let catalog = state.catalog.snapshot().await;
    catalog
        .get_activity(index)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("activity {}", index)))
}

pub async fn reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<ReloadOutcome>, ApiError> {
    let outcome = state.catalog.reload().await?;
    Ok(Json(outcome))
}

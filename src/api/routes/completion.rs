use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{estimate_with_rates, item_statuses, rank_activities, RankingOptions};
use crate::models::{
    AccountVariant, ActivityEstimate, ActivityIndex, ItemStatus, ObtainedSet, RankBy,
    RateOverrides,
};

#[derive(Debug, Deserialize)]
pub struct CompletionTimesRequest {
    #[serde(default)]
    pub obtained: ObtainedSet,

    #[serde(default)]
    pub variant: AccountVariant,

    #[serde(default)]
    pub rank_by: RankBy,

    #[serde(default)]
    pub overrides: RateOverrides,

    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CompletionTimesResponse {
    pub variant: AccountVariant,
    pub rank_by: RankBy,
    pub catalog_fingerprint: String,
    pub total: usize,
    pub activities: Vec<ActivityEstimate>,
}

pub async fn completion_times(
    State(state): State<AppState>,
    Json(req): Json<CompletionTimesRequest>,
) -> Result<Json<CompletionTimesResponse>, ApiError> {
    req.overrides.validate()?;

    let options = RankingOptions {
        variant: req.variant,
        rank_by: req.rank_by,
        overrides: req.overrides,
        limit: req.limit,
    };

    let catalog = state.catalog.snapshot().await;
    let activities = rank_activities(&catalog, &req.obtained, &options);
    debug!(
        "Ranked {} activities for {} obtained items",
        activities.len(),
        req.obtained.len()
    );

    Ok(Json(CompletionTimesResponse {
        variant: options.variant,
        rank_by: options.rank_by,
        catalog_fingerprint: catalog.fingerprint().to_string(),
        total: activities.len(),
        activities,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActivityStatusRequest {
    pub activity_index: ActivityIndex,

    #[serde(default)]
    pub obtained: ObtainedSet,

    #[serde(default)]
    pub variant: AccountVariant,

    #[serde(default)]
    pub overrides: RateOverrides,
}

#[derive(Debug, Serialize)]
pub struct ActivityStatusResponse {
    pub variant: AccountVariant,
    pub completions_per_hour: f64,
    pub completable: bool,
    pub estimate: ActivityEstimate,
    pub items: Vec<ItemStatus>,
}

pub async fn activity_status(
    State(state): State<AppState>,
    Json(req): Json<ActivityStatusRequest>,
) -> Result<Json<ActivityStatusResponse>, ApiError> {
    req.overrides.validate()?;

    let catalog = state.catalog.snapshot().await;
    let activity = catalog
        .get_activity(req.activity_index)
        .ok_or_else(|| ApiError::NotFound(format!("activity {}", req.activity_index)))?;

    let cph = req.overrides.completions_per_hour(activity, req.variant);
    let estimate = estimate_with_rates(
        activity,
        cph,
        req.overrides.extra_time(activity),
        &req.obtained,
    );

    Ok(Json(ActivityStatusResponse {
        variant: req.variant,
        completions_per_hour: cph,
        completable: cph > 0.0,
        estimate,
        items: item_statuses(activity, &req.obtained),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::{fixture_state, post_json};
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn indices(json: &serde_json::Value) -> Vec<u64> {
        json["activities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["activity_index"].as_u64().unwrap())
            .collect()
    }

    fn approx(value: &serde_json::Value, expected: f64) -> bool {
        (value.as_f64().unwrap() - expected).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_completion_times_main() {
        let app = build_router(fixture_state());
        let (status, json) = post_json(app, "/api/completion-times", r#"{"obtained": []}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["variant"], "main");
        assert_eq!(json["rank_by"], "next_log_slot");
        // Dagannoth Kings has no main throughput.
        assert_eq!(indices(&json), vec![5, 7]);

        let mole = &json["activities"][0];
        assert!(approx(&mole["droprate_neither"], 40.0));
        assert_eq!(mole["droprate_independent"], 50.0);
        assert!(approx(&mole["time_to_exact"], 4.0));
        assert_eq!(mole["time_to_ei"], 5.0);
        assert_eq!(mole["fastest_slot"]["item_id"], 100);

        let vorkath = &json["activities"][1];
        assert_eq!(vorkath["droprate_neither"], "n/a");
        assert_eq!(vorkath["time_to_exact"], "n/a");
    }

    #[tokio::test]
    async fn test_completion_times_iron() {
        let app = build_router(fixture_state());
        let body = json!({"obtained": [100], "variant": "iron"}).to_string();
        let (status, json) = post_json(app, "/api/completion-times", &body).await;

        assert_eq!(status, StatusCode::OK);
        // Vorkath has no iron throughput.
        assert_eq!(indices(&json), vec![5, 6]);
        assert!(approx(&json["activities"][0]["droprate_neither"], 200.0));
    }

    #[tokio::test]
    async fn test_completion_times_with_overrides_and_limit() {
        let app = build_router(fixture_state());
        let body = json!({
            "obtained": [],
            "rank_by": "base_time",
            "overrides": {"5": {"disabled": true}},
            "limit": 1
        })
        .to_string();
        let (status, json) = post_json(app, "/api/completion-times", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(indices(&json), vec![7]);
        assert_eq!(json["total"], 1);
    }

    #[tokio::test]
    async fn test_completion_times_rejects_negative_override() {
        let app = build_router(fixture_state());
        let body = json!({"overrides": {"5": {"completions_per_hour_main": -3.0}}}).to_string();
        let (status, json) = post_json(app, "/api/completion-times", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_activity_status() {
        let app = build_router(fixture_state());
        let body = json!({"activity_index": 6, "obtained": [], "variant": "iron"}).to_string();
        let (status, json) = post_json(app, "/api/activity-status", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["completable"], true);
        assert_eq!(json["completions_per_hour"], 4.0);

        let items = json["items"].as_array().unwrap();
        assert_eq!(items[0]["active"], true);
        // The ring waits on the prime pet.
        assert_eq!(items[1]["active"], false);
        assert_eq!(json["estimate"]["fastest_slot"]["item_id"], 600);
    }

    #[tokio::test]
    async fn test_activity_status_not_completable() {
        let app = build_router(fixture_state());
        let body = json!({"activity_index": 6}).to_string();
        let (status, json) = post_json(app, "/api/activity-status", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["completable"], false);
        assert_eq!(json["estimate"]["time_to_ei"], "n/a");
    }

    #[tokio::test]
    async fn test_activity_status_unknown_activity() {
        let app = build_router(fixture_state());
        let (status, _) =
            post_json(app, "/api/activity-status", r#"{"activity_index": 42}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub activities: usize,
    pub drop_items: usize,
    pub catalog_fingerprint: String,
    pub catalog_loaded_at: DateTime<Utc>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalog = state.catalog.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        activities: catalog.len(),
        drop_items: catalog.item_count(),
        catalog_fingerprint: catalog.fingerprint().to_string(),
        catalog_loaded_at: catalog.loaded_at(),
    })
}

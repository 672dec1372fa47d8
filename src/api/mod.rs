//! REST API endpoints.
//!
//! Axum-based HTTP API over the shared catalog: activity lookup,
//! completion-time ranking and collection log import.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::catalog::CatalogLoadError;
use crate::collection_log::LogParseError;
use crate::fetch::SourceError;
use crate::models::OverrideError;

use self::state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<OverrideError> for ApiError {
    fn from(e: OverrideError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<LogParseError> for ApiError {
    fn from(e: LogParseError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::InvalidUsername(_) => ApiError::BadRequest(e.to_string()),
            SourceError::HttpStatus { status: 404, .. } => {
                ApiError::NotFound("collection log for that username".to_string())
            }
            SourceError::Http(_) | SourceError::HttpStatus { .. } | SourceError::Parse(_) => {
                ApiError::Upstream(e.to_string())
            }
            SourceError::InvalidUrl(_) | SourceError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogLoadError> for ApiError {
    fn from(e: CatalogLoadError) -> Self {
        match e {
            CatalogLoadError::NoSource => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return cors.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => cors.allow_origin(value),
        Err(_) => {
            warn!("Ignoring invalid CORS origin {:?}, allowing any", origin);
            cors.allow_origin(Any)
        }
    }
}

/// Create the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/activities", get(routes::catalog::list_activities))
        .route("/activities/:index", get(routes::catalog::get_activity))
        .route("/catalog/reload", post(routes::catalog::reload_catalog))
        .route("/completion-times", post(routes::completion::completion_times))
        .route("/activity-status", post(routes::completion::activity_status))
        .route("/collection-log", post(routes::collection_log::import_collection_log));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    #[test]
    fn test_source_error_mapping() {
        let err: ApiError = SourceError::InvalidUsername(String::new()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = SourceError::HttpStatus {
            status: 404,
            message: "Not Found".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = SourceError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[test]
    fn test_catalog_error_mapping() {
        let err: ApiError = CatalogLoadError::NoSource.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = CatalogLoadError::DuplicateActivity(3).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = build_router(fixture_state());
        let (status, _) = get_json(app, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let app = build_router(fixture_state());
        let (status, json) = get_json(app, "/api/activities/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"]["message"].as_str().unwrap().contains("999"));
    }

    async fn allowed_origin(cors_origin: &str) -> Option<String> {
        let mut config = AppConfig::default();
        config.server.cors_origin = cors_origin.to_string();
        let state = AppState::new(fixture_state().catalog, Arc::new(config)).unwrap();

        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_specific_origin() {
        assert_eq!(
            allowed_origin("http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[tokio::test]
    async fn test_cors_any_origin() {
        assert_eq!(allowed_origin("*").await.as_deref(), Some("*"));
        // An unusable origin falls back to any.
        assert_eq!(allowed_origin("bad\norigin").await.as_deref(), Some("*"));
    }
}

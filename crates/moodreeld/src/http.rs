//! HTTP routing and handlers.
//!
//! Response shapes follow the upstream contract: success responses carry
//! `{analysis, recommendations, message}`, error responses `{error,
//! message}` with 400 for a missing/empty upload and 500 for a processing
//! failure. Catalog trouble never fails the recommend route.

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use moodreel_catalog::{CatalogClient, MovieSummary};
use moodreel_core::{select_genres, AttributeResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{EngineHandle, EngineStatus};

/// Multipart field carrying the uploaded photograph.
const UPLOAD_FIELD: &str = "file";

/// Shared state for all routes.
pub struct AppState {
    pub engine: EngineHandle,
    pub status: EngineStatus,
    pub catalog: Option<CatalogClient>,
    pub analyze_timeout: Duration,
}

#[derive(Serialize)]
struct RecommendResponse {
    analysis: AttributeResult,
    recommendations: Vec<MovieSummary>,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: &'static str,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/recommend", post(recommend))
        .route("/api/search", get(search))
        .route("/api/trending", get(trending))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "moodreeld is running" }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "emotion_model": state.status.emotion_model,
        "age_gender_model": state.status.age_gender_model,
        "catalog_token": state.catalog.is_some(),
    }))
}

/// Upload → attribute inference → genre selection → catalog lookup.
async fn recommend(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<RecommendResponse>, ErrorReply> {
    let bytes = read_upload(&mut multipart).await.map_err(bad_request)?;

    let analysis =
        match tokio::time::timeout(state.analyze_timeout, state.engine.analyze(bytes)).await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(err)) => {
                tracing::error!(error = %err, "analysis failed");
                return Err(internal_error(err.to_string()));
            }
            Err(_) => {
                tracing::error!("analysis timed out");
                return Err(internal_error("analysis timed out".to_string()));
            }
        };

    let genres = select_genres(analysis.emotion, analysis.age, analysis.gender);
    let recommendations = match &state.catalog {
        Some(catalog) => catalog.recommendations_for(&genres).await,
        None => Vec::new(),
    };

    Ok(Json(RecommendResponse {
        analysis,
        recommendations,
        message: "Analysis complete",
    }))
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ErrorReply> {
    let catalog = state.catalog.as_ref().ok_or_else(catalog_unconfigured)?;
    catalog
        .search_multi(&params.query)
        .await
        .map(Json)
        .map_err(|err| bad_gateway(err.to_string()))
}

async fn trending(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ErrorReply> {
    let catalog = state.catalog.as_ref().ok_or_else(catalog_unconfigured)?;
    catalog
        .trending("all", "week")
        .await
        .map(Json)
        .map_err(|err| bad_gateway(err.to_string()))
}

/// Pull the upload field out of the multipart form.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| err.to_string())?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field.bytes().await.map_err(|err| err.to_string())?;
            if data.is_empty() {
                return Err("No file selected".to_string());
            }
            return Ok(data.to_vec());
        }
    }
    Err("No file uploaded".to_string())
}

fn bad_request(error: String) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error,
            message: "Invalid upload",
        }),
    )
}

fn internal_error(error: String) -> ErrorReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error,
            message: "Failed to process image",
        }),
    )
}

fn bad_gateway(error: String) -> ErrorReply {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error,
            message: "Catalog lookup failed",
        }),
    )
}

fn catalog_unconfigured() -> ErrorReply {
    bad_gateway("catalog token not configured".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodreel_core::{Emotion, Gender};

    #[test]
    fn test_recommend_response_shape() {
        let response = RecommendResponse {
            analysis: AttributeResult {
                emotion: Emotion::Happy,
                age: 27,
                gender: Gender::Female,
                confidence: 0.91,
            },
            recommendations: vec![],
            message: "Analysis complete",
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["analysis"]["emotion"], "happy");
        assert_eq!(json["analysis"]["age"], 27);
        assert_eq!(json["message"], "Analysis complete");
        assert!(json["recommendations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_error_response_shape() {
        let (status, Json(body)) = bad_request("No file uploaded".to_string());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "No file uploaded");
        assert_eq!(json["message"], "Invalid upload");
    }
}

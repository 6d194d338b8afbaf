//! axum HTTP surface (spec §4.6). CORS preflight is answered by
//! `tower_http::cors::CorsLayer` itself, before the request reaches any
//! handler — so `OPTIONS` never triggers index restoration, satisfying
//! the health-check semantics without special-casing the method.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::error::SearchApiError;
use crate::request::SearchRequest;
use crate::state::AppState;

pub fn build_router(state: AppState, allowed_origin: Option<&str>) -> Router {
    let cors = match allowed_origin {
        Some(origin) => match origin.parse() {
            Ok(origin) => CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any),
            Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
        },
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/search", get(search_get).post(search_post))
        .layer(cors)
        .with_state(state)
}

async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<serde_json::Value>, SearchApiError> {
    let request = SearchRequest::from_query_params(&params);
    handle(state, request).await
}

async fn search_post(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<serde_json::Value>, SearchApiError> {
    let Json(request) = body.map_err(|e| SearchApiError::BadRequest(e.to_string()))?;
    handle(state, request).await
}

async fn handle(state: AppState, request: SearchRequest) -> Result<Json<serde_json::Value>, SearchApiError> {
    let started = Instant::now();
    let index = state.ensure_index().await?;

    if request.is_health_check() {
        return Ok(Json(serde_json::json!({
            "hits": [],
            "total": 0,
            "processingTimeMs": started.elapsed().as_millis() as u64,
        })));
    }

    let mut response = crate::engine::execute(&index, &request);
    response.processing_time_ms = started.elapsed().as_millis() as u64;
    Ok(Json(serde_json::to_value(response).map_err(|_| SearchApiError::InternalError)?))
}

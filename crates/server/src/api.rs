//! The read-only HTTP surface. Everything here is a between-tick snapshot:
//! handlers lock the world or scheduler briefly, copy out plain data, and
//! serialize it. The only write path into the simulation is the scheduler
//! tick, which never runs on these routes.
//!
//! `/health` is open; every `/v1/*` route requires the static API key in
//! the `x-api-key` header.

use crate::engine;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tellus::SimError;
use tower_http::cors::CorsLayer;

/// Shared state for the router: just the key to compare against.
#[derive(Clone)]
pub struct ApiState {
    pub api_key: String,
}

/// Build the full router.
pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/v1/time", get(time))
        .route("/v1/world", get(world_summary))
        .route("/v1/cache", get(cache_stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a core error onto an HTTP status: missing singletons are a 503 (the
/// service exists but isn't ready), bad arguments are the caller's fault,
/// anything else is ours.
fn error_response(err: SimError) -> Response {
    let status = match &err {
        SimError::NotInitialized(_) => StatusCode::SERVICE_UNAVAILABLE,
        SimError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn require_api_key(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.api_key.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing or invalid api key" })),
        )
            .into_response();
    }
    next.run(request).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn time() -> Response {
    match engine::time_snapshot() {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => error_response(err),
    }
}

async fn world_summary() -> Response {
    let world = match engine::world() {
        Ok(world) => world,
        Err(err) => return error_response(err),
    };
    let world = world.lock();
    let config = world.config();
    let metadata = world.metadata();
    Json(json!({
        "widthM": config.width_m,
        "heightM": config.height_m,
        "cellSizeM": config.cell_size_m,
        "chunkCells": config.chunk_cells,
        "worldTilesX": config.world_tiles_x(),
        "worldTilesY": config.world_tiles_y(),
        "seaLevelBiasM": metadata.sea_level_bias_m,
        "coarseRes": metadata.coarse_res,
        "oceanFraction": metadata.ocean_fraction(),
    }))
    .into_response()
}

async fn cache_stats() -> Response {
    match engine::world() {
        Ok(world) => {
            let stats = world.lock().cache_stats();
            Json(stats).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(ApiState {
            api_key: "secret".into(),
        })
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let response = test_router()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_key() {
        for uri in ["/v1/time", "/v1/world", "/v1/cache"] {
            let response = test_router()
                .oneshot(
                    HttpRequest::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let response = test_router()
                .oneshot(
                    HttpRequest::builder()
                        .uri(uri)
                        .header("x-api-key", "wrong")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    /// With the right key but no world/engine initialized, the surface
    /// reports unavailable rather than erroring out.
    #[tokio::test]
    async fn test_uninitialized_maps_to_503() {
        // These tests never initialize the singletons, but others in the
        // binary might; tolerate both outcomes by checking the status is
        // one of the two valid ones
        let response = test_router()
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/time")
                    .header("x-api-key", "secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(
            response.status() == StatusCode::SERVICE_UNAVAILABLE
                || response.status() == StatusCode::OK
        );
    }
}

//! API Server module
//!
//! This module provides the reference navigation backend: it serves and stores
//! the tree and accepts move analytics, keeping everything in memory.

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::client::{AnalyticsSink, Gateway, MemoryGateway};
use crate::models::{MoveRecord, NavTree};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8081).into(),
        }
    }
}

/// Acknowledgement body for writes and errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

/// Builds the router over the given store
pub fn router(store: MemoryGateway) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/nav", get(get_nav).post(store_nav))
        .route("/track", post(track_move))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

/// Starts the API server
pub async fn serve(
    store: MemoryGateway,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting server on {}", config.address);
    let listener = TcpListener::bind(config.address).await?;
    axum::serve(listener, router(store)).await?;

    Ok(())
}

async fn get_nav(State(store): State<MemoryGateway>) -> Response {
    match store.fetch_tree().await {
        Ok(tree) => (StatusCode::OK, Json(tree)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn store_nav(State(store): State<MemoryGateway>, Json(tree): Json<NavTree>) -> Response {
    if let Err(e) = tree.validate() {
        tracing::warn!("Rejected navigation: {}", e);
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match store.store_tree(&tree).await {
        Ok(()) => {
            tracing::info!(items = tree.ids().len(), "Saved navigation");
            (StatusCode::OK, Json(ApiResponse::success())).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn track_move(
    State(store): State<MemoryGateway>,
    Json(record): Json<MoveRecord>,
) -> Response {
    tracing::info!(
        id = %record.item_id,
        from = record.from_index,
        to = record.to_index,
        "Tracked move"
    );
    match store.record_move(&record).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success())).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_tree;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt; // for `collect`
    use serde_json::json;
    use tower::ServiceExt; // for `oneshot`

    // Helper to make a request and return the status and raw body
    async fn request(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_get_nav_returns_bare_array() {
        let app = router(MemoryGateway::new(seed_tree()));

        let (status, body) = request(&app, "GET", "/nav", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        let tree: NavTree = serde_json::from_slice(&body).unwrap();
        assert_eq!(tree, seed_tree());
    }

    #[tokio::test]
    async fn test_post_nav_replaces_tree() {
        let store = MemoryGateway::new(seed_tree());
        let app = router(store.clone());
        let reordered = seed_tree().set_title("1", "Home");

        let body = Body::from(serde_json::to_vec(&reordered).unwrap());
        let (status, body) = request(&app, "POST", "/nav", body).await;

        assert_eq!(status, StatusCode::OK);
        let ack: ApiResponse = serde_json::from_slice(&body).unwrap();
        assert!(ack.success);
        assert_eq!(store.tree(), reordered);
    }

    #[tokio::test]
    async fn test_post_nav_rejects_third_level() {
        let store = MemoryGateway::new(seed_tree());
        let app = router(store.clone());
        let deep = json!([{
            "id": "a", "title": "A", "url": "/a", "visible": true,
            "children": [{
                "id": "a-1", "title": "A1", "url": "/a/1", "visible": true,
                "children": []
            }]
        }]);

        let (status, body) = request(&app, "POST", "/nav", Body::from(deep.to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let ack: ApiResponse = serde_json::from_slice(&body).unwrap();
        assert!(!ack.success);
        assert!(ack.error.unwrap().contains("a-1"));
        assert_eq!(store.tree(), seed_tree());
    }

    #[tokio::test]
    async fn test_track_records_move() {
        let store = MemoryGateway::default();
        let app = router(store.clone());

        let body = Body::from(json!({ "id": "2", "from": 1, "to": 0 }).to_string());
        let (status, _) = request(&app, "POST", "/track", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            store.moves(),
            vec![MoveRecord {
                item_id: "2".to_string(),
                from_index: 1,
                to_index: 0,
            }]
        );
    }
}

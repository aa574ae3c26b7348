//! HTTP liveness/health endpoints for process supervisors.
//!
//! Shares no state with the bot.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub bot: &'static str,
    pub mode: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn home() -> Json<Liveness> {
    Json(Liveness {
        status: "online",
        bot: "Forex Pairs Bot",
        mode: "polling",
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub async fn health() -> (StatusCode, Json<Health>) {
    (StatusCode::OK, Json(Health { status: "healthy" }))
}

pub fn create_router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Health server listening");
    axum::serve(listener, create_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = create_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, json) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let (status, json) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "online");
        assert_eq!(json["bot"], "Forex Pairs Bot");
        assert_eq!(json["mode"], "polling");
        let ts = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = create_router()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

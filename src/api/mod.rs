pub mod auth;
pub mod chat;
pub mod session;
pub mod state;

pub use session::Principal;
pub use state::AppState;

use std::path::Path;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use tower_http::{
    cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::error::AppError;

/// 302 with an explicit Location header.
pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // Pages
        .route("/", get(index))
        .route("/send.html", get(send_page))
        .route("/version", get(version))
        // Authentication endpoints
        .route("/login", get(auth::login))
        .route("/auth", get(auth::auth_callback))
        .route("/logout", get(auth::logout))
        // Chat endpoints
        .route("/send", post(chat::send_message))
        .route("/send-image", post(chat::send_image))
        .route("/messages", get(chat::get_messages))
        // Static assets, including uploaded images
        .nest_service("/static", ServeDir::new(static_dir))
        // Request timeout
        .layer(TimeoutLayer::new(timeout))
        // CORS is wide open so a phone on the LAN can reach the API
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(user: Option<Principal>) -> Html<String> {
    match user {
        Some(p) => Html(format!(
            "<h1>Hello {}</h1> <a href=\"/logout\">logout</a>",
            p.name.as_deref().unwrap_or("there")
        )),
        None => Html("<a href=\"/login\">login</a>".to_string()),
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({"version": env!("CARGO_PKG_VERSION")}))
}

/// The chat UI. Anonymous visitors get bounced to /login.
async fn send_page(
    State(state): State<AppState>,
    user: Option<Principal>,
) -> Result<Response, AppError> {
    if user.is_none() {
        return Ok(found("/login"));
    }

    let path = Path::new(&state.config.static_dir).join("send.html");
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to load chat UI: {}", e)))?;
    Ok(Html(html).into_response())
}

use super::templates::{render_body, LandingBody, MessageBody};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use std::sync::Arc;

/// Liveness probe - always returns OK if the process is running
pub async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn landing_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = render_body(&LandingBody {
        login_path: "/login",
    });
    Html(state.renderer.render("Access Gate", &body))
}

pub async fn not_found_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = render_body(&MessageBody {
        heading: "Not Found",
        message: "There is nothing at this address.",
        detail: None,
    });
    (
        StatusCode::NOT_FOUND,
        Html(state.renderer.render("Not Found", &body)),
    )
}

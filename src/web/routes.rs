use super::errors::critical_error_response;
use super::handlers::{healthz_handler, landing_handler, not_found_handler};
use super::render::PageRenderer;
use crate::{
    auth::{callback_handler, login_handler},
    AppState,
};
use axum::{routing::get, Router};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

pub fn create_router(state: Arc<AppState>) -> Router {
    let renderer = state.renderer.clone();

    let routes = Router::new()
        .route("/", get(landing_handler))
        .route("/healthz", get(healthz_handler))
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found_handler);

    with_error_layers(routes, renderer).with_state(state)
}

/// Panics become the critical error page; every request is traced.
fn with_error_layers(
    routes: Router<Arc<AppState>>,
    renderer: Arc<PageRenderer>,
) -> Router<Arc<AppState>> {
    routes
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            critical_error_response(&renderer, panic)
        }))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        let vars: HashMap<String, String> = [
            ("DISCORD_CLIENT_ID", "client-123"),
            ("DISCORD_CLIENT_SECRET", "shh"),
            ("DISCORD_REDIRECT_URI", "http://gate.localhost/callback"),
            ("REQUIRED_SERVER_ID", "guild-1"),
            ("REQUIRED_ROLE_IDS", "role-a"),
            ("COMMAND_TO_RUN", "true"),
            (
                "PAGE_TEMPLATE_PATH",
                concat!(env!("CARGO_MANIFEST_DIR"), "/templates/page.html"),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppState::new(Config::from_map(&vars).unwrap()).unwrap()
    }

    async fn exploding_handler() -> &'static str {
        panic!("handler blew up")
    }

    #[tokio::test]
    async fn test_panicking_handler_renders_critical_page() {
        let state = state();
        let routes = Router::new().route("/explode", get(exploding_handler));
        let app = with_error_layers(routes, state.renderer.clone()).with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("<title>Critical Error</title>"));
        assert!(!body.contains("handler blew up"));
    }
}

//! HTTP route handlers.

pub mod auth;
pub mod front;
pub mod health;
pub mod helpers;
pub mod management;

use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::not_found;
use crate::session::create_session_layer;
use crate::state::AppState;

/// One row of the `/mappings` route table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Mapping {
    pub method: &'static str,
    pub path: &'static str,
    pub handler: &'static str,
    /// Required authority, if any.
    pub secured: Option<&'static str>,
    /// `form`, `basic` or `none`.
    pub authentication: &'static str,
}

const fn mapping(
    method: &'static str,
    path: &'static str,
    handler: &'static str,
    secured: Option<&'static str>,
    authentication: &'static str,
) -> Mapping {
    Mapping {
        method,
        path,
        handler,
        secured,
        authentication,
    }
}

/// Every route served by [`app`].
pub const MAPPINGS: &[Mapping] = &[
    mapping("GET", "/", "front::home", Some("ROLE_ADMIN"), "form"),
    mapping("GET", "/access", "front::access", None, "none"),
    mapping("GET", "/login", "auth::login_form", None, "none"),
    mapping("POST", "/login", "auth::login_form_submit", None, "none"),
    mapping("POST", "/logout", "auth::logout", None, "form"),
    mapping("GET", "/health", "health::health_check", None, "none"),
    mapping("GET", "/beans", "management::beans", Some("ROLE_ADMIN"), "basic"),
    mapping("GET", "/mappings", "management::mappings", Some("ROLE_ADMIN"), "basic"),
    mapping("GET", "/metrics", "management::metrics", Some("ROLE_ADMIN"), "basic"),
];

/// Build the full application router.
///
/// Layers (last added = first executed): TraceLayer → session → routes.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(front::router())
        .merge(auth::router())
        .merge(health::router())
        .merge(management::router(&state))
        .fallback(not_found)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Management endpoints.
//!
//! Guarded by HTTP Basic authentication and `ROLE_ADMIN`: no credentials (or
//! wrong ones) get a 401 challenge, a valid non-admin account gets 403.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::middleware::{BasicAuth, authenticate_basic, challenge};
use crate::permissions::{Decision, Secured};
use crate::state::{AppState, Component};

use super::{MAPPINGS, Mapping};

/// Error body for a denied management call.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    error: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct BeansContext<'a> {
    context: &'static str,
    parent: Option<&'static str>,
    beans: &'a [Component],
}

/// Create the management router.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/beans", get(beans))
        .route("/mappings", get(mappings))
        .route("/metrics", get(metrics))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_basic,
        ))
}

/// Run a management method's security check.
fn require_management(
    state: &AppState,
    auth: Option<Extension<BasicAuth>>,
    method: &str,
) -> Result<(), Response> {
    let principal = auth.map(|Extension(auth)| auth.principal);
    match state.security().check(method, principal, Secured::ADMIN) {
        Decision::Granted(_) => Ok(()),
        Decision::Unauthenticated => Err(challenge(&state.config().management_realm)),
        Decision::Denied(_) => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                status: StatusCode::FORBIDDEN.as_u16(),
                error: "Forbidden",
                message: "Access is denied",
            }),
        )
            .into_response()),
    }
}

/// GET /beans
async fn beans(State(state): State<AppState>, auth: Option<Extension<BasicAuth>>) -> Response {
    if let Err(response) = require_management(&state, auth, "beans") {
        return response;
    }

    Json(vec![BeansContext {
        context: "application",
        parent: None,
        beans: state.components(),
    }])
    .into_response()
}

/// GET /mappings
async fn mappings(
    State(state): State<AppState>,
    auth: Option<Extension<BasicAuth>>,
) -> Response {
    if let Err(response) = require_management(&state, auth, "mappings") {
        return response;
    }

    Json::<&[Mapping]>(MAPPINGS).into_response()
}

/// GET /metrics
async fn metrics(State(state): State<AppState>, auth: Option<Extension<BasicAuth>>) -> Response {
    if let Err(response) = require_management(&state, auth, "metrics") {
        return response;
    }

    let (granted, denied) = state.security().counts();
    let uptime = chrono::Utc::now() - state.started_at();

    Json(json!({
        "uptime_seconds": uptime.num_seconds(),
        "users": state.users().len(),
        "security.access.granted": granted,
        "security.access.denied": denied,
    }))
    .into_response()
}

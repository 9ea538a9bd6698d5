//! Front page and access-denied page.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use tower_sessions::Session;

use crate::error::AppError;
use crate::form::generate_csrf_token;
use crate::permissions::Secured;
use crate::state::AppState;

use super::helpers::{access_denied, render_page, require_page};

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/access", get(access))
}

/// Home page, secured for `ROLE_ADMIN`.
///
/// GET /
async fn home(State(state): State<AppState>, session: Session) -> Response {
    let principal = match require_page(&state, &session, "home", Secured::ADMIN).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    // Token for the logout form
    let csrf_token = match generate_csrf_token(&session).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to generate CSRF token");
            return AppError::Internal(e).into_response();
        }
    };

    let mut context = tera::Context::new();
    context.insert("username", &principal.username);
    context.insert("authorities", &principal.authorities());
    context.insert("csrf_token", &csrf_token);

    render_page(&state, "home.html", context).into_response()
}

/// Access-denied page.
///
/// GET /access
async fn access(State(state): State<AppState>) -> Response {
    access_denied(&state, "You do not have permission to view this page.")
}

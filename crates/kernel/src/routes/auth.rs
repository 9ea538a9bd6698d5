//! Authentication routes (form login, logout).

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::AppError;
use crate::form::{clear_csrf_tokens, generate_csrf_token, verify_csrf_token};
use crate::models::Principal;
use crate::session::SESSION_USERNAME;
use crate::state::AppState;

use super::helpers::{access_denied, found, render_page, root_url};

/// Message shown when the submitted form token is missing or stale.
const INVALID_CSRF_MESSAGE: &str =
    "Invalid CSRF token. Reload the form and try again.";

/// Flags carried back to the login page after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub logout: Option<String>,
}

/// Form-based login request.
///
/// Credentials default to empty so the CSRF check always runs first.
#[derive(Debug, Deserialize)]
pub struct LoginFormRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "_csrf")]
    pub csrf_token: Option<String>,
}

/// Logout form.
#[derive(Debug, Deserialize)]
pub struct LogoutFormRequest {
    #[serde(rename = "_csrf")]
    pub csrf_token: Option<String>,
}

/// Login form handler.
///
/// GET /login
/// - Renders login form with CSRF token (this issues the session cookie)
async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    let csrf_token = match generate_csrf_token(&session).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to generate CSRF token");
            return AppError::Internal(e).into_response();
        }
    };

    let error = query
        .error
        .is_some()
        .then_some("Invalid username and password.");
    let notice = query.logout.is_some().then_some("You have been logged out.");

    let mut context = tera::Context::new();
    context.insert("csrf_token", &csrf_token);
    context.insert("error", &error);
    context.insert("notice", &notice);

    render_page(&state, "login.html", context).into_response()
}

/// Form-based login handler.
///
/// POST /login (form data)
/// - 403 when the CSRF token is missing, unknown or reused
/// - 302 to `/login?error` on bad credentials
/// - 302 to the application root on success
async fn login_form_submit(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LoginFormRequest>,
) -> Response {
    if !csrf_ok(&state, &session, form.csrf_token.as_deref()).await {
        warn!("login rejected: invalid CSRF token");
        return access_denied(&state, INVALID_CSRF_MESSAGE);
    }

    let principal = match authenticate(&state, form.username, form.password).await {
        Ok(Some(principal)) => principal,
        Ok(None) => return found("/login?error"),
        Err(response) => return response,
    };

    if let Err(response) = setup_session(&session, &principal).await {
        return response;
    }

    info!(user = %principal.username, roles = ?principal.authorities(), "user logged in");
    found(&root_url(&state, &headers))
}

/// Logout handler.
///
/// POST /logout
/// - Requires a valid CSRF token
/// - Destroys the session and clears the cookie
async fn logout(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LogoutFormRequest>,
) -> Response {
    if !csrf_ok(&state, &session, form.csrf_token.as_deref()).await {
        warn!("logout rejected: invalid CSRF token");
        return access_denied(&state, INVALID_CSRF_MESSAGE);
    }

    let username: Option<String> = session.get(SESSION_USERNAME).await.ok().flatten();

    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "failed to delete session");
        return AppError::Internal(anyhow::anyhow!("session flush failed: {e}"))
            .into_response();
    }

    if let Some(user) = username {
        info!(user = %user, "user logged out");
    }
    found("/login?logout")
}

/// Check and consume a submitted form token.
async fn csrf_ok(state: &AppState, session: &Session, submitted: Option<&str>) -> bool {
    let Some(token) = submitted else {
        return false;
    };
    matches!(verify_csrf_token(session, state.csrf(), token).await, Ok(true))
}

/// Verify credentials off the async executor.
async fn authenticate(
    state: &AppState,
    username: String,
    password: String,
) -> Result<Option<Principal>, Response> {
    let users = state.users().clone();
    let name = username.clone();
    let result = tokio::task::spawn_blocking(move || users.authenticate(&name, &password)).await;

    match result {
        Ok(Some(principal)) => Ok(Some(principal)),
        Ok(None) => {
            info!(user = %username, "login failed: bad credentials");
            Ok(None)
        }
        Err(e) => {
            tracing::error!(error = %e, "password verification task failed");
            Err(AppError::Internal(anyhow::anyhow!(
                "password verification task failed: {e}"
            ))
            .into_response())
        }
    }
}

/// Initialize session state after successful authentication.
///
/// The session id is rotated and tokens issued to the anonymous session are
/// discarded.
async fn setup_session(session: &Session, principal: &Principal) -> Result<(), Response> {
    let internal = |what: &str, e: tower_sessions::session::Error| {
        tracing::error!(error = %e, "failed to {what}");
        AppError::Internal(anyhow::anyhow!("failed to {what}: {e}")).into_response()
    };

    session
        .cycle_id()
        .await
        .map_err(|e| internal("rotate session id", e))?;

    clear_csrf_tokens(session).await.map_err(|e| {
        tracing::error!(error = %e, "failed to clear CSRF tokens");
        AppError::Internal(e).into_response()
    })?;

    session
        .insert(SESSION_USERNAME, &principal.username)
        .await
        .map_err(|e| internal("store username in session", e))?;

    Ok(())
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login_form_submit))
        .route("/logout", post(logout))
}

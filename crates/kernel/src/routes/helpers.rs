//! Shared route helpers for page rendering and page-level security.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::Session;

use crate::models::Principal;
use crate::permissions::{Decision, Secured};
use crate::session::SESSION_USERNAME;
use crate::state::AppState;

/// Resolve the session's principal, if someone is logged in.
///
/// Roles are read from the directory on every call, so the session only
/// stores the username.
pub async fn current_principal(state: &AppState, session: &Session) -> Option<Principal> {
    let username: Option<String> = session.get(SESSION_USERNAME).await.ok().flatten();
    let username = username?;
    state.users().find_by_name(&username).map(|u| u.principal())
}

/// Run a page method's security check.
///
/// Anonymous visitors are redirected to `/login`; authenticated users without
/// the required role get the 403 access page.
pub async fn require_page(
    state: &AppState,
    session: &Session,
    method: &str,
    secured: Secured,
) -> Result<Principal, Response> {
    let principal = current_principal(state, session).await;
    match state.security().check(method, principal, secured) {
        Decision::Granted(principal) => Ok(principal),
        Decision::Unauthenticated => Err(found("/login")),
        Decision::Denied(_) => Err(access_denied(
            state,
            "You do not have permission to view this page.",
        )),
    }
}

/// `302 Found` redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Render the 403 access page.
pub fn access_denied(state: &AppState, message: &str) -> Response {
    let mut context = tera::Context::new();
    context.insert("message", message);
    let body = render_page(state, "access.html", context);
    (StatusCode::FORBIDDEN, body).into_response()
}

/// Render a page template, falling back to a bare error page.
pub fn render_page(state: &AppState, template: &str, context: tera::Context) -> Html<String> {
    match state.theme().render(template, context) {
        Ok(html) => Html(html),
        Err(e) => {
            tracing::error!(error = %e, template = %template, "failed to render template");
            Html(format!(
                r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Template Error</h1><pre>{}</pre></body></html>"#,
                html_escape(&format!("{e:#}"))
            ))
        }
    }
}

/// Absolute URL of the application root.
///
/// Uses the configured site URL, else the request `Host`, else `/`.
/// The `Host` header is client-controlled: deployments should set `SITE_URL`
/// so the post-login redirect cannot be pointed at another origin.
pub fn root_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(site_url) = &state.config().site_url {
        return format!("{site_url}/");
    }

    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(|host| format!("http://{host}/"))
        .unwrap_or_else(|| "/".to_string())
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

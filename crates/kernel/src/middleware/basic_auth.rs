//! HTTP Basic authentication middleware.
//!
//! Checks `Authorization: Basic <base64(user:pass)>` headers against the user
//! directory and sets the principal for the request. Basic authentication is
//! stateless: nothing is written to the session.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::models::Principal;
use crate::state::AppState;

/// Middleware to authenticate Basic credentials.
///
/// If valid credentials are present, stores [`BasicAuth`] in request
/// extensions. If no Basic header is present, passes through without
/// modification. If the header is malformed or the credentials are wrong,
/// returns 401 with a challenge.
pub async fn authenticate_basic(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(auth_header) = auth_header else {
        return next.run(request).await;
    };

    if !has_basic_scheme(auth_header) {
        return next.run(request).await;
    }

    let Some((username, password)) = parse_basic(auth_header) else {
        debug!("malformed basic credentials");
        return challenge(&state.config().management_realm);
    };

    let users = state.users().clone();
    let verified = tokio::task::spawn_blocking({
        let username = username.clone();
        move || users.authenticate(&username, &password)
    })
    .await;

    match verified {
        Ok(Some(principal)) => {
            request.extensions_mut().insert(BasicAuth { principal });
            next.run(request).await
        }
        Ok(None) => {
            debug!(user = %username, "basic authentication failed");
            challenge(&state.config().management_realm)
        }
        Err(e) => {
            tracing::error!(error = %e, "password verification task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Basic authentication info for a verified request.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub principal: Principal,
}

/// 401 response asking the client for Basic credentials.
pub fn challenge(realm: &str) -> Response {
    let value = format!("Basic realm=\"{}\"", realm.replace('"', ""));
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, value)],
        "Full authentication is required to access this resource",
    )
        .into_response()
}

fn has_basic_scheme(header_value: &str) -> bool {
    header_value
        .get(..6)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("basic "))
}

/// Decode a `Basic` header value into (username, password).
pub fn parse_basic(header_value: &str) -> Option<(String, String)> {
    if !has_basic_scheme(header_value) {
        return None;
    }
    let encoded = header_value[6..].trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

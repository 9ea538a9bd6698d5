//! Session management backed by the in-process memory store.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "GATEHOUSE_SESSION";

/// Session key for storing the authenticated username.
pub const SESSION_USERNAME: &str = "username";

/// Map the configured SameSite policy, defaulting to `Lax`.
pub fn same_site(policy: &str) -> SameSite {
    match policy {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Create the session layer.
pub fn create_session_layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.cookie_secure)
        .with_http_only(true)
        .with_same_site(same_site(&config.cookie_same_site))
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            config.session_expiry_minutes,
        )))
}

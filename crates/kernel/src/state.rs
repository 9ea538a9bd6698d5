//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::form::CsrfLedger;
use crate::models::UserDirectory;
use crate::permissions::MethodSecurity;
use crate::theme::ThemeEngine;

/// A named service wired into the application, as listed by `/beans`.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub bean: &'static str,
    pub scope: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub dependencies: Vec<&'static str>,
}

impl Component {
    fn singleton<T>(bean: &'static str, dependencies: &[&'static str]) -> Self {
        Self {
            bean,
            scope: "singleton",
            type_name: std::any::type_name::<T>(),
            dependencies: dependencies.to_vec(),
        }
    }
}

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Loaded configuration.
    config: Config,

    /// Account store used by form login and Basic authentication.
    users: Arc<UserDirectory>,

    /// Method-level access decisions.
    security: MethodSecurity,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Consumed form tokens, shared by every session.
    csrf: CsrfLedger,

    /// Everything above, for the management surface.
    components: Vec<Component>,

    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state, hashing the seeded accounts.
    pub fn new(config: &Config) -> Result<Self> {
        let users = UserDirectory::from_seeds(&config.users, config.argon2_memory_kib)
            .context("failed to build user directory")?;
        info!(users = users.len(), "user directory loaded");

        let theme = ThemeEngine::new().context("failed to initialize theme engine")?;

        let components = vec![
            Component::singleton::<Config>("config", &[]),
            Component::singleton::<UserDirectory>("userDirectory", &["config"]),
            Component::singleton::<MethodSecurity>("methodSecurity", &[]),
            Component::singleton::<ThemeEngine>("themeEngine", &[]),
            Component::singleton::<CsrfLedger>("csrfLedger", &[]),
            Component::singleton::<tower_sessions::MemoryStore>("sessionStore", &["config"]),
            Component::singleton::<crate::middleware::BasicAuth>(
                "basicAuthentication",
                &["userDirectory", "config"],
            ),
        ];

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config: config.clone(),
                users: Arc::new(users),
                security: MethodSecurity::new(),
                theme: Arc::new(theme),
                csrf: CsrfLedger::new(),
                components,
                started_at: Utc::now(),
            }),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the user directory.
    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.inner.users
    }

    /// Get the method security service.
    pub fn security(&self) -> &MethodSecurity {
        &self.inner.security
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Get the CSRF token ledger.
    pub fn csrf(&self) -> &CsrfLedger {
        &self.inner.csrf
    }

    /// Registered components.
    pub fn components(&self) -> &[Component] {
        &self.inner.components
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}

//! The application under test and the HTTP clients pointed at it.

use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::error::FlowResult;
use crate::login::LoginFlow;
use crate::probe::Probe;

/// Base URL of a running application plus client options.
#[derive(Debug, Clone)]
pub struct Target {
    base: Url,
    timeout: Option<Duration>,
}

impl Target {
    /// Parse a base URL such as `http://localhost:8080`.
    pub fn new(base_url: &str) -> FlowResult<Self> {
        Ok(Self {
            base: Url::parse(base_url)?,
            timeout: None,
        })
    }

    /// Apply a per-request timeout. Without one the client default applies.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a path (or absolute URL) against the base.
    pub fn url(&self, path: &str) -> FlowResult<Url> {
        Ok(self.base.join(path)?)
    }

    /// The application root, where a successful login lands.
    pub fn root(&self) -> FlowResult<Url> {
        self.url("/")
    }

    /// The CSRF-aware login flow against this target.
    pub fn login_flow(&self) -> FlowResult<LoginFlow> {
        Ok(LoginFlow::new(self.clone(), self.probe()?))
    }

    /// A probe that reports redirects instead of following them.
    pub fn probe(&self) -> FlowResult<Probe> {
        Ok(Probe::new(self.clone(), self.client(Policy::none())?))
    }

    /// A probe that follows redirects like a browser would.
    pub fn browsing_probe(&self) -> FlowResult<Probe> {
        Ok(Probe::new(self.clone(), self.client(Policy::default())?))
    }

    /// Build a client. No cookie store: cookies are carried explicitly.
    pub(crate) fn client(&self, redirects: Policy) -> FlowResult<Client> {
        let mut builder = Client::builder().redirect(redirects);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

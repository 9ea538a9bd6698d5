//! CSRF-aware form login.
//!
//! 1. GET `/login`, keeping the `Set-Cookie` value and the hidden `_csrf`
//!    field from the body.
//! 2. POST `/login` with `username`, `password` and `_csrf`, echoing the
//!    cookie.
//! 3. Expect `302 Found` with a `Location` pointing at the application root.
//!
//! A page without a token is a hard error; there is no fallback and no retry.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, COOKIE, LOCATION};
use tracing::{debug, info};
use url::Url;

use crate::error::{FlowError, FlowResult};
use crate::extract::{extract_csrf_token, session_cookie};
use crate::probe::{Access, Probe, ProbeResult};
use crate::target::Target;

/// A username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// What the login page handed out.
#[derive(Debug, Clone)]
pub struct LoginPage {
    pub url: Url,
    /// `name=value` session cookie.
    pub cookie: String,
    pub csrf_token: String,
}

/// Response to the login POST.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub status: StatusCode,
    pub location: Option<String>,
    /// The rotated session cookie when the server sent one, else the cookie
    /// from the login page.
    pub cookie: String,
}

/// Drives the login form of a [`Target`].
#[derive(Debug, Clone)]
pub struct LoginFlow {
    target: Target,
    probe: Probe,
}

impl LoginFlow {
    pub(crate) fn new(target: Target, probe: Probe) -> Self {
        Self { target, probe }
    }

    /// Step 1: load the login page and pull out its cookie and token.
    pub async fn fetch_login_page(&self) -> FlowResult<LoginPage> {
        let url = self.target.url("/login")?;
        let response = self
            .probe
            .client()
            .get(url.clone())
            .header(ACCEPT, "text/html")
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FlowError::UnexpectedStatus {
                url: url.to_string(),
                expected: StatusCode::OK,
                actual: status,
            });
        }

        let cookie = session_cookie(response.headers()).ok_or_else(|| {
            FlowError::MissingCookie {
                url: url.to_string(),
            }
        })?;
        let body = response.text().await?;
        let csrf_token =
            extract_csrf_token(&body).ok_or_else(|| FlowError::MissingCsrfToken {
                url: url.to_string(),
            })?;

        debug!(%url, "fetched login page");
        Ok(LoginPage {
            url,
            cookie,
            csrf_token,
        })
    }

    /// Step 2: submit the credentials with the page's token and cookie.
    ///
    /// Redirects are reported, not followed.
    pub async fn submit(
        &self,
        credentials: &Credentials,
        page: &LoginPage,
    ) -> FlowResult<LoginOutcome> {
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("_csrf", page.csrf_token.as_str()),
        ];

        let response = self
            .probe
            .client()
            .post(page.url.clone())
            .header(ACCEPT, "text/html")
            .header(COOKIE, page.cookie.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let cookie = session_cookie(response.headers()).unwrap_or_else(|| page.cookie.clone());

        debug!(user = %credentials.username, %status, ?location, "submitted login form");
        Ok(LoginOutcome {
            status,
            location,
            cookie,
        })
    }

    /// Steps 1-3: log in and insist on a redirect to the application root.
    pub async fn login(&self, credentials: &Credentials) -> FlowResult<LoginOutcome> {
        let page = self.fetch_login_page().await?;
        let outcome = self.submit(credentials, &page).await?;

        if outcome.status != StatusCode::FOUND {
            return Err(FlowError::UnexpectedStatus {
                url: page.url.to_string(),
                expected: StatusCode::FOUND,
                actual: outcome.status,
            });
        }

        let location = self.redirect_target(&outcome, &page.url)?;
        let root = self.target.root()?;
        if location != root {
            return Err(FlowError::UnexpectedLocation {
                expected: root.to_string(),
                actual: location.to_string(),
            });
        }

        info!(user = %credentials.username, "logged in");
        Ok(outcome)
    }

    /// GET the redirect target of a login, carrying the session cookie.
    pub async fn follow(&self, outcome: &LoginOutcome) -> FlowResult<ProbeResult> {
        let url = self.target.url("/login")?;
        let location = self.redirect_target(outcome, &url)?;
        self.probe
            .get_url(location, &Access::Cookie(outcome.cookie.clone()))
            .await
    }

    /// The probe sharing this flow's client settings.
    pub fn probe(&self) -> &Probe {
        &self.probe
    }

    fn redirect_target(&self, outcome: &LoginOutcome, from: &Url) -> FlowResult<Url> {
        let location = outcome
            .location
            .as_deref()
            .ok_or_else(|| FlowError::MissingLocation {
                url: from.to_string(),
            })?;
        self.target.url(location)
    }
}

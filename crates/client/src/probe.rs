//! Authorization probes.
//!
//! A probe issues one GET with a chosen kind of credential and compares the
//! status against the expected access-control outcome.

use std::fmt;

use reqwest::header::{ACCEPT, COOKIE, LOCATION};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{FlowError, FlowResult};
use crate::login::Credentials;
use crate::target::Target;

/// Expected access-control outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Expected {
    Ok,
    Unauthorized,
    Forbidden,
    Found,
}

impl Expected {
    pub fn status(self) -> StatusCode {
        match self {
            Expected::Ok => StatusCode::OK,
            Expected::Unauthorized => StatusCode::UNAUTHORIZED,
            Expected::Forbidden => StatusCode::FORBIDDEN,
            Expected::Found => StatusCode::FOUND,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status())
    }
}

/// How a probe authenticates.
#[derive(Debug, Clone)]
pub enum Access {
    Anonymous,
    /// A `name=value` session cookie from a previous response.
    Cookie(String),
    /// Per-request HTTP Basic credentials.
    Basic(Credentials),
}

/// A probed response.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub url: Url,
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl ProbeResult {
    /// Fail unless the status matches.
    pub fn expect(self, expected: Expected) -> FlowResult<Self> {
        if self.status == expected.status() {
            Ok(self)
        } else {
            Err(FlowError::UnexpectedStatus {
                url: self.url.to_string(),
                expected: expected.status(),
                actual: self.status,
            })
        }
    }

    /// Fail unless the body contains `needle`.
    pub fn expect_body_contains(self, needle: &str) -> FlowResult<Self> {
        if self.body.contains(needle) {
            Ok(self)
        } else {
            Err(FlowError::BodyMismatch {
                url: self.url.to_string(),
                needle: needle.to_string(),
            })
        }
    }
}

/// Issues probe requests against a [`Target`].
#[derive(Debug, Clone)]
pub struct Probe {
    target: Target,
    client: Client,
}

impl Probe {
    pub(crate) fn new(target: Target, client: Client) -> Self {
        Self { target, client }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// GET a path relative to the target.
    pub async fn get(&self, path: &str, access: &Access) -> FlowResult<ProbeResult> {
        let url = self.target.url(path)?;
        self.get_url(url, access).await
    }

    /// GET an absolute URL.
    pub async fn get_url(&self, url: Url, access: &Access) -> FlowResult<ProbeResult> {
        let mut request = self.client.get(url.clone()).header(ACCEPT, "text/html");
        request = match access {
            Access::Anonymous => request,
            Access::Cookie(cookie) => request.header(COOKIE, cookie.as_str()),
            Access::Basic(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!(%url, %status, "probe");
        Ok(ProbeResult {
            url,
            status,
            location,
            body,
        })
    }

    /// GET a path and check the status in one step.
    pub async fn expect(
        &self,
        path: &str,
        access: &Access,
        expected: Expected,
    ) -> FlowResult<ProbeResult> {
        self.get(path, access).await?.expect(expected)
    }
}

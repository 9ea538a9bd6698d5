#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! These helpers build the REAL kernel router and state. [`TestApp`] drives
//! the router in-process with `tower::ServiceExt::oneshot`; [`spawn_server`]
//! serves it on an ephemeral port for tests that go through the HTTP client.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatehouse_kernel::config::parse_users;
use gatehouse_kernel::{AppState, Config, app};

/// Argon2 memory cost for tests. Verification cost follows the stored hash,
/// so keeping it small keeps every login fast.
const TEST_ARGON2_MEMORY_KIB: u32 = 1024;

/// Configuration for tests: default accounts, cheap hashing, ephemeral port.
pub fn test_config() -> Config {
    Config {
        port: 0,
        bind_address: [127, 0, 0, 1].into(),
        argon2_memory_kib: TEST_ARGON2_MEMORY_KIB,
        users: parse_users("admin:admin:ADMIN|USER,user:user:USER")
            .expect("valid test users"),
        ..Config::default()
    }
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(&test_config()).expect("Failed to initialize AppState");
        let router = app(state.clone());
        Self { router, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with cookies from a previous response.
    pub async fn request_with_cookies(
        &self,
        mut request: Request<Body>,
        cookies: &str,
    ) -> Response {
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }

    /// GET `/login` and return the session cookie and the form token.
    pub async fn login_page(&self) -> (String, String) {
        let response = self
            .request(Request::get("/login").body(Body::empty()).unwrap())
            .await;
        let cookies = extract_cookies(&response);
        let body = response_text(response).await;
        let token = gatehouse_client::extract_csrf_token(&body).expect("login page has token");
        (cookies, token)
    }

    /// POST the login form with an explicit token.
    pub async fn submit_login(
        &self,
        cookies: &str,
        username: &str,
        password: &str,
        csrf: Option<&str>,
    ) -> Response {
        let mut body = format!("username={username}&password={password}");
        if let Some(token) = csrf {
            body.push_str(&format!("&_csrf={token}"));
        }
        self.request_with_cookies(
            Request::post("/login")
                .header(header::HOST, "localhost")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
            cookies,
        )
        .await
    }

    /// Log in through the form and return the rotated session cookie.
    ///
    /// # Panics
    ///
    /// Panics unless the login answers 302.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (cookies, token) = self.login_page().await;
        let response = self
            .submit_login(&cookies, username, password, Some(&token))
            .await;
        assert_eq!(response.status(), 302, "login for {username} failed");
        let rotated = extract_cookies(&response);
        if rotated.is_empty() { cookies } else { rotated }
    }
}

/// Extract `name=value` pairs from every `Set-Cookie` header.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The `Location` header of a response.
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Read a response body as text.
pub async fn response_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Read a response body as JSON.
pub async fn response_json(response: Response) -> serde_json::Value {
    let text = response_text(response).await;
    serde_json::from_str(&text).expect("Failed to parse JSON body")
}

/// `Authorization` header value for HTTP Basic.
pub fn basic(username: &str, password: &str) -> String {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Serve the real application on `127.0.0.1:0` and return its base URL.
pub async fn spawn_server() -> (String, AppState) {
    let state = AppState::new(&test_config()).expect("Failed to initialize AppState");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server failed");
    });

    (format!("http://{addr}"), state)
}

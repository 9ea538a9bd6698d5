#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Login flow failures against deliberately broken login pages.
//!
//! Each test serves a tiny router on an ephemeral port and asserts the typed
//! error the flow stops with.

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use gatehouse_client::{Credentials, FlowError, Target};

const TOKEN_FORM: &str = r#"<form method="post" action="/login">
<input type="hidden" name="_csrf" value="abc123">
</form>"#;

const TOKENLESS_FORM: &str = r#"<form method="post" action="/login">
<input type="text" name="username">
</form>"#;

/// Serve `router` on `127.0.0.1:0` and return a target pointing at it.
async fn serve(router: Router) -> Target {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Target::new(&format!("http://{addr}")).unwrap()
}

fn with_cookie(body: &'static str) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, "SESSION=s1; Path=/; HttpOnly")],
        Html(body),
    )
}

#[tokio::test]
async fn page_without_token_is_missing_csrf_token() {
    let router = Router::new().route("/login", get(|| async { with_cookie(TOKENLESS_FORM) }));
    let target = serve(router).await;

    let err = target
        .login_flow()
        .unwrap()
        .fetch_login_page()
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::MissingCsrfToken { .. }), "{err}");
}

#[tokio::test]
async fn page_without_cookie_is_missing_cookie() {
    let router = Router::new().route("/login", get(|| async { Html(TOKEN_FORM) }));
    let target = serve(router).await;

    let err = target
        .login_flow()
        .unwrap()
        .fetch_login_page()
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::MissingCookie { .. }), "{err}");
}

#[tokio::test]
async fn non_ok_login_page_is_unexpected_status() {
    let router = Router::new().route(
        "/login",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let target = serve(router).await;

    let err = target
        .login_flow()
        .unwrap()
        .fetch_login_page()
        .await
        .unwrap_err();
    match err {
        FlowError::UnexpectedStatus {
            expected, actual, ..
        } => {
            assert_eq!(expected.as_u16(), 200);
            assert_eq!(actual.as_u16(), 503);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn well_formed_page_yields_cookie_and_token() {
    let router = Router::new().route("/login", get(|| async { with_cookie(TOKEN_FORM) }));
    let target = serve(router).await;

    let page = target
        .login_flow()
        .unwrap()
        .fetch_login_page()
        .await
        .unwrap();
    assert_eq!(page.cookie, "SESSION=s1");
    assert_eq!(page.csrf_token, "abc123");
}

#[tokio::test]
async fn login_stops_before_submitting_without_a_token() {
    // The POST would answer 302 to the root; the flow must not reach it.
    let router = Router::new().route(
        "/login",
        get(|| async { with_cookie(TOKENLESS_FORM) })
            .post(|| async { (StatusCode::FOUND, [(header::LOCATION, "/")]) }),
    );
    let target = serve(router).await;

    let err = target
        .login_flow()
        .unwrap()
        .login(&Credentials::new("admin", "admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::MissingCsrfToken { .. }), "{err}");
}

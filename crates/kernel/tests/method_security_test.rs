#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end access-control tests.
//!
//! The real application is served on an ephemeral port and driven over HTTP
//! with the `gatehouse-client` login flow and probes.

use gatehouse_client::matrix::{default_matrix, run};
use gatehouse_client::{Access, Credentials, Expected, FlowError, Target};

mod common;
use common::spawn_server;

async fn target() -> Target {
    let (base_url, _state) = spawn_server().await;
    Target::new(&base_url).unwrap()
}

#[tokio::test]
async fn anonymous_home_follows_to_login_page() {
    let target = target().await;

    target
        .browsing_probe()
        .unwrap()
        .expect("/", &Access::Anonymous, Expected::Ok)
        .await
        .unwrap()
        .expect_body_contains("<title>Login")
        .unwrap();
}

#[tokio::test]
async fn anonymous_home_without_following_is_found() {
    let target = target().await;

    let result = target
        .probe()
        .unwrap()
        .expect("/", &Access::Anonymous, Expected::Found)
        .await
        .unwrap();
    assert_eq!(result.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn admin_login_with_csrf_lands_on_home() {
    let target = target().await;
    let flow = target.login_flow().unwrap();

    let outcome = flow.login(&Credentials::new("admin", "admin")).await.unwrap();
    assert_eq!(outcome.location.as_deref(), Some(target.root().unwrap().as_str()));

    let home = flow.follow(&outcome).await.unwrap();
    home.expect(Expected::Ok).unwrap();
}

#[tokio::test]
async fn user_login_with_csrf_is_denied_home() {
    let target = target().await;
    let flow = target.login_flow().unwrap();

    let outcome = flow.login(&Credentials::new("user", "user")).await.unwrap();
    flow.follow(&outcome)
        .await
        .unwrap()
        .expect(Expected::Forbidden)
        .unwrap()
        .expect_body_contains("Access denied")
        .unwrap();
}

#[tokio::test]
async fn wrong_password_is_not_a_login() {
    let target = target().await;
    let flow = target.login_flow().unwrap();

    let page = flow.fetch_login_page().await.unwrap();
    let outcome = flow
        .submit(&Credentials::new("admin", "wrong"), &page)
        .await
        .unwrap();
    assert_eq!(outcome.status, 302);
    assert_eq!(outcome.location.as_deref(), Some("/login?error"));

    let err = flow
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnexpectedLocation { .. }), "{err}");
}

#[tokio::test]
async fn replayed_login_page_token_is_rejected() {
    let target = target().await;
    let flow = target.login_flow().unwrap();

    let page = flow.fetch_login_page().await.unwrap();
    let admin = Credentials::new("admin", "admin");
    flow.submit(&Credentials::new("admin", "wrong"), &page)
        .await
        .unwrap();

    let replay = flow.submit(&admin, &page).await.unwrap();
    assert_eq!(replay.status, 403);
}

#[tokio::test]
async fn management_basic_auth_matrix() {
    let target = target().await;
    let probe = target.probe().unwrap();

    probe
        .expect("/beans", &Access::Anonymous, Expected::Unauthorized)
        .await
        .unwrap();
    probe
        .expect(
            "/beans",
            &Access::Basic(Credentials::new("admin", "admin")),
            Expected::Ok,
        )
        .await
        .unwrap();
    probe
        .expect(
            "/beans",
            &Access::Basic(Credentials::new("user", "user")),
            Expected::Forbidden,
        )
        .await
        .unwrap();
    probe
        .expect(
            "/mappings",
            &Access::Basic(Credentials::new("admin", "admin")),
            Expected::Ok,
        )
        .await
        .unwrap();
    probe
        .expect("/health", &Access::Anonymous, Expected::Ok)
        .await
        .unwrap();
}

#[tokio::test]
async fn session_cookie_does_not_unlock_management() {
    let target = target().await;
    let flow = target.login_flow().unwrap();

    let outcome = flow.login(&Credentials::new("admin", "admin")).await.unwrap();
    flow.probe()
        .expect("/beans", &Access::Cookie(outcome.cookie), Expected::Unauthorized)
        .await
        .unwrap();
}

#[tokio::test]
async fn default_matrix_passes_against_live_server() {
    let target = target().await;

    let reports = run(&target, &default_matrix()).await.unwrap();
    assert_eq!(reports.len(), default_matrix().len());
    for report in &reports {
        assert!(report.passed, "{}: {:?}", report.name, report.error);
    }
}

//! Registration, login, and session guard behavior.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use ticketslave_integration_tests::TestApp;

#[tokio::test]
async fn register_then_login_succeeds_once_per_username() {
    let app = TestApp::spawn().await;
    let body = serde_json::json!({ "username": "alice", "password": "password1" });

    let res = app.request(TestApp::json("POST", "/register", &body, None)).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let created = TestApp::body_json(res).await;
    assert_eq!(created["username"], "alice");
    assert_eq!(created["role"], "regular");

    // Same username again: conflict
    let res = app.request(TestApp::json("POST", "/register", &body, None)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The first registration can still log in
    let res = app.request(TestApp::json("POST", "/login", &body, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_and_login("alice", "password1").await;

    let body = serde_json::json!({ "username": "alice", "password": "nope-nope" });
    let res = app.request(TestApp::json("POST", "/login", &body, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Unknown users fail the same way
    let body = serde_json::json!({ "username": "mallory", "password": "password1" });
    let res = app.request(TestApp::json("POST", "/login", &body, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unauthenticated_ticket_access_is_rejected() {
    let app = TestApp::spawn().await;

    // No session at all
    let res = app.request(TestApp::get("/tickets/1", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.request(TestApp::get("/tickets", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Garbage cookie is as good as none
    let res = app
        .request(TestApp::get("/tickets/1", Some("ts_session=forged")))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_identity_roundtrip() {
    let app = TestApp::spawn().await;
    let cookie = app.register_and_login("alice", "password1").await;

    let res = app.request(TestApp::get("/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = TestApp::body_json(res).await;
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::spawn().await;
    let cookie = app.register_and_login("alice", "password1").await;

    let res = app
        .request(TestApp::bodyless("POST", "/logout", Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The old cookie no longer authenticates
    let res = app.request(TestApp::get("/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let app = TestApp::spawn().await;
    let body = serde_json::json!({ "username": "alice", "password": "short" });

    let res = app.request(TestApp::json("POST", "/register", &body, None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let app = TestApp::spawn().await;
    let cookie = app.register_and_login("alice", "password1").await;

    let body = serde_json::json!({
        "current_password": "wrong",
        "new_password": "password2",
    });
    let res = app
        .request(TestApp::json("POST", "/me/password", &body, Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = serde_json::json!({
        "current_password": "password1",
        "new_password": "password2",
    });
    let res = app
        .request(TestApp::json("POST", "/me/password", &body, Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // New password works, old one doesn't
    app.login("alice", "password2").await;
    let body = serde_json::json!({ "username": "alice", "password": "password1" });
    let res = app.request(TestApp::json("POST", "/login", &body, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

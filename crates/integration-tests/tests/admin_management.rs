//! Admin-only surfaces: queues, user administration, settings.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use ticketslave_integration_tests::TestApp;

/// Register a user, promote them, and return an admin session cookie.
async fn admin_session(app: &TestApp, username: &str) -> String {
    app.register_and_login(username, "password1").await;
    app.promote_to_admin(username).await;
    app.login(username, "password1").await
}

#[tokio::test]
async fn queue_management_is_admin_only() {
    let app = TestApp::spawn().await;
    let alice = app.register_and_login("alice", "password1").await;

    let body = serde_json::json!({ "name": "IT" });
    let res = app
        .request(TestApp::json("POST", "/queues", &body, Some(&alice)))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let root = admin_session(&app, "root").await;
    let res = app
        .request(TestApp::json("POST", "/queues", &body, Some(&root)))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Duplicate queue names conflict
    let res = app
        .request(TestApp::json("POST", "/queues", &body, Some(&root)))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Everyone can list
    let res = app.request(TestApp::get("/queues", Some(&alice))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let queues = TestApp::body_json(res).await;
    assert_eq!(queues.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_empty_queue_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let root = admin_session(&app, "root").await;

    let res = app
        .request(TestApp::json(
            "POST",
            "/queues",
            &serde_json::json!({ "name": "IT" }),
            Some(&root),
        ))
        .await;
    let queue_id = TestApp::body_json(res).await["id"].as_i64().unwrap();

    let body = serde_json::json!({ "title": "t", "queue_id": queue_id });
    app.request(TestApp::json("POST", "/tickets", &body, Some(&root)))
        .await;

    let res = app
        .request(TestApp::bodyless(
            "DELETE",
            &format!("/queues/{queue_id}"),
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn referenced_user_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let root = admin_session(&app, "root").await;
    let alice = app.register_and_login("alice", "password1").await;
    let alice_id = app.user_id("alice").await;

    let queue_id = app.seed_queue("IT").await;
    let body = serde_json::json!({ "title": "t", "queue_id": queue_id });
    app.request(TestApp::json("POST", "/tickets", &body, Some(&alice)))
        .await;

    // alice created a ticket, so deletion is blocked
    let res = app
        .request(TestApp::bodyless(
            "DELETE",
            &format!("/users/{alice_id}"),
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // an unreferenced user deletes cleanly
    app.register_and_login("carol", "password1").await;
    let carol_id = app.user_id("carol").await;
    let res = app
        .request(TestApp::bodyless(
            "DELETE",
            &format!("/users/{carol_id}"),
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn role_changes_are_admin_only() {
    let app = TestApp::spawn().await;
    let root = admin_session(&app, "root").await;
    let alice = app.register_and_login("alice", "password1").await;
    let alice_id = app.user_id("alice").await;

    // alice can't promote herself
    let body = serde_json::json!({ "role": "admin" });
    let res = app
        .request(TestApp::json(
            "PATCH",
            &format!("/users/{alice_id}"),
            &body,
            Some(&alice),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // root can
    let res = app
        .request(TestApp::json(
            "PATCH",
            &format!("/users/{alice_id}"),
            &body,
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let user = TestApp::body_json(res).await;
    assert_eq!(user["role"], "admin");

    // root can't demote themselves
    let root_id = app.user_id("root").await;
    let res = app
        .request(TestApp::json(
            "PATCH",
            &format!("/users/{root_id}"),
            &serde_json::json!({ "role": "regular" }),
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_can_be_closed() {
    let app = TestApp::spawn().await;
    let root = admin_session(&app, "root").await;

    let res = app
        .request(TestApp::json(
            "PUT",
            "/settings",
            &serde_json::json!({ "allow_registration": false }),
            Some(&root),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = serde_json::json!({ "username": "latecomer", "password": "password1" });
    let res = app.request(TestApp::json("POST", "/register", &body, None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Settings are admin-only reads too
    let res = app.request(TestApp::get("/settings", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

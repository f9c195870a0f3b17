mod common;

use axum::http::StatusCode;
use common::{get, post_json, seed_store, seed_user, spawn_app};
use serde_json::json;

#[tokio::test]
async fn login_returns_token_and_public_profiles() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    let user_id = seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;

    let (status, body) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["token"].as_str().map(str::len), Some(64));
    assert_eq!(body["usuario"]["id"], json!(user_id));
    assert_eq!(body["usuario"]["email"], json!("ana@example.com"));
    assert_eq!(body["tienda"]["id"], json!(store_id));
    assert_eq!(body["tienda"]["url"], json!("https://shop.example.com"));
    // The encrypted credential never appears in the login response.
    assert!(body["tienda"].get("app_password_encrypted").is_none());

    assert_eq!(
        t.state
            .storage
            .session_count_for_user(user_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn login_with_wrong_password_issues_no_session() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    let user_id = seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;

    let (status, body) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "wrong"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid credentials"));
    assert_eq!(
        t.state
            .storage
            .session_count_for_user(user_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn login_with_missing_fields_is_rejected() {
    let t = spawn_app().await;
    let (status, _) = post_json(&t.app, "/auth", json!({"email": "ana@example.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_fails_for_inactive_user() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    let user_id = seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;
    common::deactivate_user(&t.state, user_id).await;

    let (status, _) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_fails_when_user_has_no_store() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    let user_id = seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;
    common::clear_user_store(&t.state, user_id).await;

    let (status, _) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_fails_when_store_is_inactive() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;
    common::deactivate_store(&t.state, store_id).await;

    let (status, _) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_accepts_username_as_identifier() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    let hash = bcrypt::hash("hunter22", common::TEST_BCRYPT_COST).unwrap();
    t.state
        .storage
        .insert_user("ana@example.com", Some("ana"), None, &hash, store_id)
        .await
        .unwrap();

    let (status, body) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn password_change_requires_session_and_updates_hash() {
    let t = spawn_app().await;
    let store_id = seed_store(&t.state, "https://shop.example.com", "wpadmin", "pw").await;
    seed_user(&t.state, "ana@example.com", "hunter22", store_id).await;

    let (_, login) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;
    let token = login["token"].as_str().unwrap().to_string();

    // Too short.
    let (status, _) = post_json(
        &t.app,
        "/cambiar-password",
        json!({"token": token, "current_password": "hunter22", "new_password": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Wrong current password.
    let (status, _) = post_json(
        &t.app,
        "/cambiar-password",
        json!({"token": token, "current_password": "nope", "new_password": "hunter23"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid change.
    let (status, body) = post_json(
        &t.app,
        "/cambiar-password",
        json!({"token": token, "current_password": "hunter22", "new_password": "hunter23"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    // Old password no longer works; the new one does.
    let (status, _) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter22"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = post_json(
        &t.app,
        "/auth",
        json!({"email": "ana@example.com", "password": "hunter23"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_change_with_invalid_token_is_unauthorized() {
    let t = spawn_app().await;
    let (status, _) = post_json(
        &t.app,
        "/cambiar-password",
        json!({"token": "bogus", "current_password": "a", "new_password": "longenough"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_options_is_answered_at_the_boundary() {
    let t = spawn_app().await;
    use tower::ServiceExt;
    let resp = t
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("OPTIONS")
                .uri("/proxy")
                .header("origin", "https://panel.example.com")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert!(resp.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn unknown_admin_action_is_a_validation_error() {
    let t = spawn_app().await;
    let (status, _) = get(&t.app, "/admin/tiendas?action=explode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//! Login, registration and bearer-token handling.

use actix_web::test;
use run_report_lib::models::Role;
use serde_json::json;

use super::helpers::*;

fn login_request(username: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/login")
        .set_form([("username", username), ("password", password)])
        .to_request()
}

#[actix_rt::test]
async fn test_login_issues_usable_token() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    create_user(&pool, "alice", Role::User).await;

    let (status, body) = send(&app, login_request("alice", TEST_PASSWORD)).await;
    assert_eq!(status, 200);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = get_json(&app, &token, "/me").await;
    assert_eq!(status, 200);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "user");
    assert!(me["projects"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_login_rejects_bad_credentials() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    create_user(&pool, "alice", Role::User).await;

    let (status, body) = send(&app, login_request("alice", "wrong")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = send(&app, login_request("nobody", TEST_PASSWORD)).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_register_then_login() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({"username": "bob", "password": "s3cret"}))
        .to_request();
    let (status, user) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(user["role"], "user");

    let (status, _) = send(&app, login_request("bob", "s3cret")).await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_register_rejections() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    create_user(&pool, "taken", Role::User).await;

    let cases = [
        (json!({"username": "taken", "password": "x"}), 400),
        (json!({"username": "  ", "password": "x"}), 400),
        (json!({"username": "carol", "password": ""}), 400),
        (json!({"username": "carol", "password": "x", "role": "viewer"}), 400),
        (json!({"username": "carol", "password": "x", "role": "admin"}), 403),
    ];
    for (body, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(body.clone())
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, expected, "{}", body);
    }

    // Nothing from the rejected attempts was stored
    assert!(pool.find_user_by_username("carol").await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_bad_or_missing_tokens() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "alice", Role::User).await;

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
    assert_eq!(resp.headers().get("WWW-Authenticate").unwrap(), "Bearer");

    let (status, _) = get_json(&app, "not-a-jwt", "/me").await;
    assert_eq!(status, 401);

    let mut tampered = token.clone();
    tampered.push('x');
    let (status, _) = get_json(&app, &tampered, "/me").await;
    assert_eq!(status, 401);

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Basic {}", token)))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_token_of_deleted_user_is_rejected() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "ghost", Role::User).await;

    let (status, _) = delete(&app, &admin_token, &format!("/users/{}", user_id)).await;
    assert_eq!(status, 200);

    let (status, _) = get_json(&app, &user_token, "/me").await;
    assert_eq!(status, 401);
}

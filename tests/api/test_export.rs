//! Report export in each output format.

use actix_web::test;
use run_report_lib::models::Role;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

#[actix_rt::test]
async fn test_json_export_includes_steps_only_when_detailed() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;
    submit(&app, &token, run_payload("with steps", "PASS", 2)).await;
    submit(&app, &token, run_payload("other", "FAIL", 0)).await;

    let (status, runs) = get_json(&app, &token, "/export-report/").await;
    assert_eq!(status, 200);
    assert_eq!(runs.as_array().unwrap().len(), 2);
    assert!(runs[0].get("steps").is_none());
    assert_eq!(runs[0]["test_name"], "with steps");

    let (_, runs) = get_json(&app, &token, "/export-report/?format=json&detailed=true").await;
    assert_eq!(runs[0]["steps"].as_array().unwrap().len(), 2);

    let (_, runs) = get_json(&app, &token, "/export-report/?status=fail").await;
    assert_eq!(runs.as_array().unwrap().len(), 1);
    assert_eq!(runs[0]["test_name"], "other");
}

#[actix_rt::test]
async fn test_pdf_export_is_an_attachment() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;
    let id = submit(&app, &token, run_payload("Checkout (guest)", "FAIL", 3)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/export-report/?format=pdf&detailed=true&test_id={}", id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers().get("Content-Type").unwrap(), "application/pdf");
    assert_eq!(
        resp.headers().get("Content-Disposition").unwrap(),
        "attachment; filename=test_report.pdf"
    );

    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("Checkout \\(guest\\)"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[actix_rt::test]
async fn test_email_export_posts_to_sendgrid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("Authorization", "Bearer sg-test-key"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let pool = create_test_pool().await;
    let app = create_test_app_with_mailer(&pool, test_mailer(&server.uri())).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;
    submit(&app, &token, run_payload("nightly", "PASS", 1)).await;

    let (status, body) = get_json(
        &app,
        &token,
        "/export-report/?format=email&recipient=qa@example.com",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Email sent successfully.");

    let requests = server.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["personalizations"][0]["to"][0]["email"], "qa@example.com");
    assert_eq!(payload["attachments"][0]["filename"], "test_report.pdf");
    assert_eq!(payload["attachments"][0]["type"], "application/pdf");
}

#[actix_rt::test]
async fn test_email_export_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errors": ["down"]})))
        .mount(&server)
        .await;

    let pool = create_test_pool().await;
    let app = create_test_app_with_mailer(&pool, test_mailer(&server.uri())).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let (status, _) = get_json(&app, &token, "/export-report/?format=email").await;
    assert_eq!(status, 400);
    let (status, _) = get_json(&app, &token, "/export-report/?format=email&recipient=nobody").await;
    assert_eq!(status, 400);
    // Rejected before anything is sent
    assert!(server.received_requests().await.unwrap().is_empty());

    let (status, body) = get_json(
        &app,
        &token,
        "/export-report/?format=email&recipient=qa@example.com",
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "EMAIL_ERROR");
}

#[actix_rt::test]
async fn test_export_rejects_unknown_format() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let (status, _) = get_json(&app, &token, "/export-report/?format=xlsx").await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_export_respects_project_visibility() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (_, user_token) = create_user(&pool, "outsider", Role::User).await;
    let project = create_project(&pool, admin_id, "alpha").await;

    let mut body = run_payload("private", "PASS", 0);
    body["test_project_id"] = json!(project);
    submit(&app, &admin_token, body).await;

    let (status, runs) = get_json(&app, &user_token, "/export-report/").await;
    assert_eq!(status, 200);
    assert_eq!(runs, json!([]));
}

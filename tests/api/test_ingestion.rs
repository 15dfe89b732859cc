//! Run ingestion: validation, suite resolution and step ordering.

use actix_web::test;
use run_report_lib::models::Role;
use serde_json::json;

use super::helpers::*;

#[actix_rt::test]
async fn test_steps_round_trip_in_order() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let mut body = run_payload("checkout", "pass", 0);
    body["steps"] = json!([
        {"step_number": 1, "step_description": "open cart", "step_status": "PASS", "timestamp": "2024-04-01T10:00:00Z"},
        {"step_number": 2, "step_description": "pay", "step_status": "fail", "error_message": "Timeout waiting for pay button", "timestamp": "2024-04-01T10:00:01Z"},
        {"step_number": 3, "step_description": "cleanup", "step_status": "ERROR", "error_message": null, "timestamp": "2024-04-01T10:00:02"},
    ]);

    let id = submit(&app, &token, body).await;
    let (status, run) = get_json(&app, &token, &format!("/test-results/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(run["status"], "PASS");
    assert_eq!(run["execution_time"], 2.5);

    let steps = run["steps"].as_array().unwrap();
    let numbers: Vec<i64> = steps.iter().map(|s| s["step_number"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(steps[1]["step_status"], "FAIL");
    assert_eq!(steps[1]["error_message"], "Timeout waiting for pay button");
    assert_eq!(steps[2]["step_description"], "cleanup");
}

#[actix_rt::test]
async fn test_suite_names_resolve_case_insensitively() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let mut first = run_payload("a", "PASS", 1);
    first["test_suite_name"] = json!("Smoke");
    let mut second = run_payload("b", "FAIL", 1);
    second["test_suite_name"] = json!("  smoke ");

    let first_id = submit(&app, &token, first).await;
    let second_id = submit(&app, &token, second).await;

    let (_, a) = get_json(&app, &token, &format!("/test-results/{}", first_id)).await;
    let (_, b) = get_json(&app, &token, &format!("/test-results/{}", second_id)).await;
    assert_eq!(a["test_suite_id"], b["test_suite_id"]);
    assert_eq!(a["test_suite_name"], "smoke");

    let (status, suites) = get_json(&app, &token, "/test-suites/").await;
    assert_eq!(status, 200);
    assert_eq!(suites.as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_explicit_suite_id_must_exist() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let mut body = run_payload("a", "PASS", 0);
    body["test_suite_id"] = json!(99);
    let (status, _) = post_json(&app, &token, "/submit-test-result/", body).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_invalid_payloads_are_rejected() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    // Gap in step numbering
    let mut gap = run_payload("a", "PASS", 2);
    gap["steps"][1]["step_number"] = json!(3);
    let (status, body) = post_json(&app, &token, "/submit-test-result/", gap).await;
    assert_eq!(status, 400, "{}", body);

    // Unknown run status
    let (status, body) =
        post_json(&app, &token, "/submit-test-result/", run_payload("a", "SKIPPED", 0)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    // Negative duration
    let mut negative = run_payload("a", "PASS", 0);
    negative["execution_time"] = json!(-1.0);
    let (status, _) = post_json(&app, &token, "/submit-test-result/", negative).await;
    assert_eq!(status, 400);

    // Nothing was stored
    let (_, runs) = get_json(&app, &token, "/test-results/").await;
    assert!(runs.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_project_must_exist_and_be_assigned() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, _) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "tester", Role::User).await;
    let mine = create_project(&pool, admin_id, "mine").await;
    let other = create_project(&pool, admin_id, "other").await;
    assign(&pool, admin_id, mine, user_id).await;

    let mut missing = run_payload("a", "PASS", 0);
    missing["test_project_id"] = json!(999);
    let (status, _) = post_json(&app, &user_token, "/submit-test-result/", missing).await;
    assert_eq!(status, 404);

    let mut foreign = run_payload("a", "PASS", 0);
    foreign["test_project_id"] = json!(other);
    let (status, _) = post_json(&app, &user_token, "/submit-test-result/", foreign).await;
    assert_eq!(status, 403);

    let mut allowed = run_payload("a", "PASS", 0);
    allowed["test_project_id"] = json!(mine);
    submit(&app, &user_token, allowed).await;
}

#[actix_rt::test]
async fn test_submission_requires_token() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;

    let req = test::TestRequest::post()
        .uri("/submit-test-result/")
        .set_json(run_payload("a", "PASS", 0))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_failed_step_insert_rolls_back_run_and_new_suite() {
    use sea_orm::ConnectionTrait;

    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    pool.connection()
        .execute_unprepared("DROP TABLE test_steps")
        .await
        .unwrap();

    let mut body = run_payload("half written", "FAIL", 2);
    body["test_suite_name"] = json!("Brand New Suite");
    let (status, resp) = post_json(&app, &token, "/submit-test-result/", body).await;
    assert_eq!(status, 500, "{}", resp);
    assert_eq!(resp["error"], "DATABASE_ERROR");

    let (status, runs) = get_json(&app, &token, "/test-results/").await;
    assert_eq!(status, 200);
    assert_eq!(runs, json!([]));

    let (status, suites) = get_json(&app, &token, "/test-suites/").await;
    assert_eq!(status, 200);
    assert_eq!(suites, json!([]));
}

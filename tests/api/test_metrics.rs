//! Aggregations and error clustering through the HTTP surface.

use run_report_lib::models::Role;
use serde_json::{Value, json};

use super::helpers::*;

fn run_on(name: &str, status: &str, secs: f64, ts: &str, project: i32) -> Value {
    let mut body = run_payload(name, status, 0);
    body["execution_time"] = json!(secs);
    body["timestamp"] = json!(ts);
    body["test_project_id"] = json!(project);
    body
}

fn failing_run(project: i32, messages: &[Option<&str>]) -> Value {
    let steps: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, msg)| {
            json!({
                "step_number": i + 1,
                "step_description": format!("step {}", i + 1),
                "step_status": if i % 2 == 0 { "FAIL" } else { "ERROR" },
                "error_message": msg,
                "timestamp": "2024-04-01T10:00:00Z",
            })
        })
        .collect();
    let mut body = run_payload("failing", "FAIL", 0);
    body["steps"] = Value::Array(steps);
    body["test_project_id"] = json!(project);
    body
}

#[actix_rt::test]
async fn test_aggregates_and_time_buckets() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, token) = create_user(&pool, "admin", Role::Admin).await;
    let project = create_project(&pool, admin_id, "alpha").await;
    let other = create_project(&pool, admin_id, "beta").await;

    submit(&app, &token, run_on("a", "PASS", 2.0, "2024-04-01T09:00:00Z", project)).await;
    submit(&app, &token, run_on("b", "PASS", 4.0, "2024-04-03T09:00:00Z", project)).await;
    submit(&app, &token, run_on("c", "FAIL", 6.0, "2024-04-08T09:00:00Z", project)).await;
    submit(&app, &token, run_on("d", "FAIL", 1.0, "2024-04-03T12:00:00Z", other)).await;

    let (status, agg) =
        get_json(&app, &token, &format!("/aggregated-reports/?project_id={}", project)).await;
    assert_eq!(status, 200);
    assert_eq!(agg["total_tests"], 3);
    assert_eq!(agg["passed_tests"], 2);
    assert_eq!(agg["failed_tests"], 1);
    assert!((agg["pass_rate"].as_f64().unwrap() - 200.0 / 3.0).abs() < 1e-9);
    assert!((agg["avg_execution_time"].as_f64().unwrap() - 4.0).abs() < 1e-9);

    let (_, all) = get_json(&app, &token, "/aggregated-reports/").await;
    assert_eq!(all["total_tests"], 4);

    let (_, days) = get_json(&app, &token, "/tests-per-day/").await;
    assert_eq!(
        days,
        json!([
            {"date": "2024-04-01", "count": 1},
            {"date": "2024-04-03", "count": 2},
            {"date": "2024-04-08", "count": 1},
        ])
    );

    let (_, weeks) = get_json(&app, &token, &format!("/tests-per-week/?project_id={}", project)).await;
    assert_eq!(
        weeks,
        json!([
            {"week": "2024-04-01", "count": 2},
            {"week": "2024-04-08", "count": 1},
        ])
    );
}

#[actix_rt::test]
async fn test_empty_aggregate_has_zero_rate() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let (status, agg) = get_json(&app, &token, "/aggregated-reports/").await;
    assert_eq!(status, 200);
    assert_eq!(agg["total_tests"], 0);
    assert_eq!(agg["pass_rate"], 0.0);

    let (_, days) = get_json(&app, &token, "/tests-per-day/").await;
    assert_eq!(days, json!([]));
}

#[actix_rt::test]
async fn test_aggregated_by_suite() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    for (suite, status) in [("smoke", "PASS"), ("smoke", "FAIL"), ("regression", "PASS")] {
        let mut body = run_payload("run", status, 0);
        body["test_suite_name"] = json!(suite);
        submit(&app, &token, body).await;
    }
    submit(&app, &token, run_payload("no suite", "FAIL", 0)).await;

    let (status, suites) = get_json(&app, &token, "/aggregated-by-suite/").await;
    assert_eq!(status, 200);
    let suites = suites.as_array().unwrap();
    assert_eq!(suites.len(), 2);
    let smoke = suites.iter().find(|s| s["suite_name"] == "smoke").unwrap();
    assert_eq!(smoke["total_tests"], 2);
    assert_eq!(smoke["pass_rate"], 50.0);
    let regression = suites.iter().find(|s| s["suite_name"] == "regression").unwrap();
    assert_eq!(regression["passed_tests"], 1);
}

#[actix_rt::test]
async fn test_error_types_cluster_failing_steps() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, token) = create_user(&pool, "admin", Role::Admin).await;
    let project = create_project(&pool, admin_id, "alpha").await;

    submit(
        &app,
        &token,
        failing_run(
            project,
            &[
                Some("Message: Timeout waiting for element #login"),
                Some("timeout waiting for spinner"),
                Some("element click intercepted: <div class=overlay>"),
                Some("Components used: login_page"),
                None,
                Some("Timeout waiting for element #logout"),
            ],
        ),
    )
    .await;

    let (status, metrics) =
        get_json(&app, &token, &format!("/error-types-metrics/?project_id={}", project)).await;
    assert_eq!(status, 200);
    assert_eq!(
        metrics,
        json!({
            "labels": [
                "Timeout waiting for",
                "timeout waiting for",
                "element click intercepted",
                "Unknown Error",
            ],
            "values": [2, 1, 1, 1],
        })
    );
}

#[actix_rt::test]
async fn test_error_types_requires_project() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, token) = create_user(&pool, "admin", Role::Admin).await;

    let (status, body) = get_json(&app, &token, "/error-types-metrics/").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_metrics_are_scoped_to_assigned_projects() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "tester", Role::User).await;
    let mine = create_project(&pool, admin_id, "mine").await;
    let theirs = create_project(&pool, admin_id, "theirs").await;
    assign(&pool, admin_id, mine, user_id).await;

    submit(&app, &admin_token, run_on("a", "PASS", 1.0, "2024-04-01T09:00:00Z", mine)).await;
    submit(&app, &admin_token, run_on("b", "FAIL", 1.0, "2024-04-01T09:00:00Z", theirs)).await;

    let (_, agg) = get_json(&app, &user_token, "/aggregated-reports/").await;
    assert_eq!(agg["total_tests"], 1);
    assert_eq!(agg["pass_rate"], 100.0);

    for uri in [
        format!("/aggregated-reports/?project_id={}", theirs),
        format!("/tests-per-day/?project_id={}", theirs),
        format!("/error-types-metrics/?project_id={}", theirs),
    ] {
        let (status, _) = get_json(&app, &user_token, &uri).await;
        assert_eq!(status, 403, "{}", uri);
    }
}

//! Admin-only mutations and the audit trail.

use actix_web::test;
use run_report_lib::models::Role;
use serde_json::{Value, json};

use super::helpers::*;

fn actions(logs: &Value, action: &str) -> Vec<Value> {
    logs.as_array()
        .unwrap()
        .iter()
        .filter(|l| l["action"] == action)
        .cloned()
        .collect()
}

#[actix_rt::test]
async fn test_delete_run_cascades_and_is_audited_once() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let id = submit(&app, &admin_token, run_payload("doomed", "FAIL", 3)).await;
    let uri = format!("/test-results/{}", id);
    post_json(&app, &admin_token, &format!("{}/comments", uri), json!({"comment_text": "bye"})).await;

    let (status, body) = delete(&app, &admin_token, &uri).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Test report deleted");

    let (status, _) = get_json(&app, &admin_token, &uri).await;
    assert_eq!(status, 404);
    let steps = pool.steps_for_runs(&[id as i32]).await.unwrap();
    assert!(steps.values().all(Vec::is_empty));

    let (_, logs) = get_json(&app, &admin_token, "/audit-logs/").await;
    let deletes = actions(&logs, "Delete Test Report");
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0]["user_id"], admin_id);
    assert_eq!(deletes[0]["resource_id"], id);
    assert_eq!(deletes[0]["details"]["Test Name"], "doomed");

    let (status, _) = delete(&app, &admin_token, &uri).await;
    assert_eq!(status, 404);
    let (_, logs) = get_json(&app, &admin_token, "/audit-logs/").await;
    assert_eq!(actions(&logs, "Delete Test Report").len(), 1);
}

#[actix_rt::test]
async fn test_admin_routes_refuse_regular_users() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (_, user_token) = create_user(&pool, "tester", Role::User).await;
    let id = submit(&app, &admin_token, run_payload("keep", "PASS", 0)).await;

    let (status, body) = delete(&app, &user_token, &format!("/test-results/{}", id)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "FORBIDDEN");

    for uri in ["/users/", "/audit-logs/", "/projects/"] {
        let (status, _) = get_json(&app, &user_token, uri).await;
        assert_eq!(status, 403, "{}", uri);
    }

    let (status, _) = get_json(&app, &admin_token, &format!("/test-results/{}", id)).await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_role_update_takes_effect_immediately() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "tester", Role::User).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/users/{}/role", user_id))
        .insert_header(("Authorization", format!("Bearer {}", admin_token)))
        .set_json(json!({"role": "superuser"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);

    let req = test::TestRequest::patch()
        .uri(&format!("/users/{}/role", user_id))
        .insert_header(("Authorization", format!("Bearer {}", admin_token)))
        .set_json(json!({"role": "admin"}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], "admin");

    // Roles are reloaded per request, so the old token now has admin rights
    let (status, _) = get_json(&app, &user_token, "/users/").await;
    assert_eq!(status, 200);

    let (_, logs) = get_json(&app, &admin_token, "/audit-logs/").await;
    assert_eq!(actions(&logs, "Update User Role").len(), 1);
}

#[actix_rt::test]
async fn test_deleting_user_keeps_comments_as_unknown() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "leaver", Role::User).await;
    let project = create_project(&pool, admin_id, "alpha").await;
    assign(&pool, admin_id, project, user_id).await;

    let mut body = run_payload("shared", "FAIL", 0);
    body["test_project_id"] = json!(project);
    let id = submit(&app, &admin_token, body).await;
    let uri = format!("/test-results/{}/comments", id);
    let (status, _) = post_json(&app, &user_token, &uri, json!({"comment_text": "seen it"})).await;
    assert_eq!(status, 200);

    let (status, deleted) = delete(&app, &admin_token, &format!("/users/{}", user_id)).await;
    assert_eq!(status, 200);
    assert_eq!(deleted["username"], "leaver");

    let (_, comments) = get_json(&app, &admin_token, &uri).await;
    assert_eq!(comments[0]["comment_text"], "seen it");
    assert_eq!(comments[0]["username"], "Unknown");
    assert_eq!(comments[0]["user_id"], Value::Null);

    let (_, users) = get_json(&app, &admin_token, "/users/").await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_admin_cannot_delete_self() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;

    let (status, _) = delete(&app, &admin_token, &format!("/users/{}", admin_id)).await;
    assert_eq!(status, 400);
    let (status, _) = delete(&app, &admin_token, "/users/999").await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_project_assignment_lifecycle() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (_, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "tester", Role::User).await;

    let (status, project) =
        post_json(&app, &admin_token, "/projects/", json!({"project_name": "Web Shop"})).await;
    assert_eq!(status, 200);
    let project_id = project["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &app,
        &admin_token,
        &format!("/projects/{}/assign-user/?user_id={}", project_id, user_id),
        Value::Null,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "User tester assigned to project Web Shop");

    let (_, mine) = get_json(&app, &user_token, "/projects/my").await;
    assert_eq!(mine[0]["id"], project_id);

    let unassign = format!("/users/{}/projects?project_id={}", user_id, project_id);
    let (status, body) = delete(&app, &admin_token, &unassign).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "User tester unassigned from project Web Shop");

    let (status, _) = delete(&app, &admin_token, &unassign).await;
    assert_eq!(status, 400);

    let (status, _) = get_json(&app, &user_token, "/projects/my").await;
    assert_eq!(status, 403);

    let (_, logs) = get_json(&app, &admin_token, "/audit-logs/").await;
    for action in ["Create Project", "Assign user to project", "Unassign user from project"] {
        assert_eq!(actions(&logs, action).len(), 1, "{}", action);
    }
}

#[actix_rt::test]
async fn test_deleting_project_keeps_runs_and_suites() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let project = create_project(&pool, admin_id, "alpha").await;

    let (status, suite) = post_json(
        &app,
        &admin_token,
        "/create-test-suite/",
        json!({"suite_name": "Smoke", "project_id": project}),
    )
    .await;
    assert_eq!(status, 200);

    let mut body = run_payload("orphan", "PASS", 0);
    body["test_project_id"] = json!(project);
    body["test_suite_id"] = suite["id"].clone();
    let id = submit(&app, &admin_token, body).await;

    let (status, body) = delete(&app, &admin_token, &format!("/projects/{}", project)).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Project deleted");

    let (_, run) = get_json(&app, &admin_token, &format!("/test-results/{}", id)).await;
    assert_eq!(run["test_project_id"], Value::Null);
    assert_eq!(run["test_suite_name"], "smoke");

    let (_, suites) = get_json(&app, &admin_token, "/test-suites/").await;
    assert_eq!(suites[0]["project_id"], Value::Null);
}

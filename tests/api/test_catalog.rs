//! Suites and favourite projects.

use actix_web::test;
use run_report_lib::models::Role;
use serde_json::{Value, json};

use super::helpers::*;

async fn patch_json<S>(app: &S, token: &str, uri: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::patch()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();
    send(app, req).await
}

#[actix_rt::test]
async fn test_suite_crud() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, token) = create_user(&pool, "admin", Role::Admin).await;
    let project = create_project(&pool, admin_id, "alpha").await;

    let (status, suite) =
        post_json(&app, &token, "/create-test-suite/", json!({"suite_name": "  Smoke "})).await;
    assert_eq!(status, 200);
    assert_eq!(suite["suite_name"], "smoke");
    let suite_id = suite["id"].as_i64().unwrap();

    let (status, _) =
        post_json(&app, &token, "/create-test-suite/", json!({"suite_name": "SMOKE"})).await;
    assert_eq!(status, 400);
    let (status, _) =
        post_json(&app, &token, "/create-test-suite/", json!({"suite_name": "   "})).await;
    assert_eq!(status, 400);
    let (status, _) = post_json(
        &app,
        &token,
        "/create-test-suite/",
        json!({"suite_name": "ghost", "project_id": 999}),
    )
    .await;
    assert_eq!(status, 404);

    let uri = format!("/test-suites/{}", suite_id);
    let (status, updated) = patch_json(
        &app,
        &token,
        &uri,
        json!({"suite_name": "Nightly", "project_id": project}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["suite_name"], "nightly");
    assert_eq!(updated["project_id"], project);

    let (_, listed) = get_json(&app, &token, &format!("/test-suites/?project_id={}", project)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let mut body = run_payload("run", "PASS", 0);
    body["test_suite_id"] = json!(suite_id);
    let run_id = submit(&app, &token, body).await;

    let (status, body) = delete(&app, &token, &uri).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Test suite deleted");

    let (_, run) = get_json(&app, &token, &format!("/test-results/{}", run_id)).await;
    assert_eq!(run["test_suite_id"], Value::Null);

    let (_, logs) = get_json(&app, &token, "/audit-logs/").await;
    let actions: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"Update Test Suite"));
    assert!(actions.contains(&"Delete Test Suite"));
}

#[actix_rt::test]
async fn test_suite_listing_and_creation_respect_projects() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, admin_token) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, user_token) = create_user(&pool, "tester", Role::User).await;
    let mine = create_project(&pool, admin_id, "mine").await;
    let theirs = create_project(&pool, admin_id, "theirs").await;
    assign(&pool, admin_id, mine, user_id).await;

    for (name, project) in [("shared", None), ("mine", Some(mine)), ("theirs", Some(theirs))] {
        let (status, _) = post_json(
            &app,
            &admin_token,
            "/create-test-suite/",
            json!({"suite_name": name, "project_id": project}),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (_, suites) = get_json(&app, &user_token, "/test-suites/").await;
    let names: Vec<&str> = suites
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["suite_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["shared", "mine"]);

    let (status, _) =
        get_json(&app, &user_token, &format!("/test-suites/?project_id={}", theirs)).await;
    assert_eq!(status, 403);
    let (status, _) = post_json(
        &app,
        &user_token,
        "/create-test-suite/",
        json!({"suite_name": "sneaky", "project_id": theirs}),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = patch_json(
        &app,
        &user_token,
        "/test-suites/1",
        json!({"suite_name": "renamed"}),
    )
    .await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_favourite_projects() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool).await;
    let (admin_id, _) = create_user(&pool, "admin", Role::Admin).await;
    let (user_id, token) = create_user(&pool, "tester", Role::User).await;
    let mine = create_project(&pool, admin_id, "mine").await;
    let theirs = create_project(&pool, admin_id, "theirs").await;
    assign(&pool, admin_id, mine, user_id).await;

    let (status, fav) = post_json(&app, &token, "/favourite-projects/", json!({"project_id": mine})).await;
    assert_eq!(status, 200);
    assert_eq!(fav["project_id"], mine);
    assert_eq!(fav["user_id"], user_id);

    let (status, _) = post_json(&app, &token, "/favourite-projects/", json!({"project_id": mine})).await;
    assert_eq!(status, 400);
    let (status, _) = post_json(&app, &token, "/favourite-projects/", json!({"project_id": theirs})).await;
    assert_eq!(status, 403);
    let (status, _) = post_json(&app, &token, "/favourite-projects/", json!({"project_id": 999})).await;
    assert_eq!(status, 404);

    let (_, favs) = get_json(&app, &token, "/favourite-projects/").await;
    assert_eq!(favs.as_array().unwrap().len(), 1);
    assert_eq!(favs[0]["project_name"], "mine");

    let uri = format!("/favourite-projects/{}", mine);
    let (status, body) = delete(&app, &token, &uri).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Project removed from favourites");
    let (status, _) = delete(&app, &token, &uri).await;
    assert_eq!(status, 404);

    let (_, favs) = get_json(&app, &token, "/favourite-projects/").await;
    assert_eq!(favs, json!([]));
}

//! Shared helpers for API tests.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use run_report_lib::api;
use run_report_lib::auth::TokenSigner;
use run_report_lib::auth::password::hash_password;
use run_report_lib::config::{DatabaseConfig, EmailConfig};
use run_report_lib::db::DbPool;
use run_report_lib::models::Role;
use run_report_lib::services::export::SendGridMailer;
use secrecy::SecretString;
use serde_json::{Value, json};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
const TEST_JWT_SECRET: &str = "api-test-secret";

/// Fresh migrated in-memory database. A single connection keeps the data alive.
pub async fn create_test_pool() -> DbPool {
    let pool = DbPool::new(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    })
    .await
    .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

pub fn test_signer() -> TokenSigner {
    TokenSigner::new(SecretString::from(TEST_JWT_SECRET.to_string()), 60)
}

/// Mailer pointing at `api_url` (a mock server), with a key configured.
pub fn test_mailer(api_url: &str) -> SendGridMailer {
    SendGridMailer::new(&EmailConfig {
        sendgrid_api_key: Some(SecretString::from("sg-test-key".to_string())),
        sender: "reports@example.com".to_string(),
        api_url: api_url.to_string(),
    })
    .expect("Failed to build mailer")
}

pub async fn create_test_app(
    pool: &DbPool,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    create_test_app_with_mailer(pool, test_mailer("http://127.0.0.1:9")).await
}

pub async fn create_test_app_with_mailer(
    pool: &DbPool,
    mailer: SendGridMailer,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_signer()))
            .app_data(web::Data::new(mailer))
            .configure(api::configure_routes),
    )
    .await
}

/// Insert a user directly and return `(id, bearer token)`.
pub async fn create_user(pool: &DbPool, username: &str, role: Role) -> (i32, String) {
    let user = pool
        .create_user(username, hash_password(TEST_PASSWORD), role)
        .await
        .expect("Failed to create user");
    let token = test_signer().issue(user.id, role).expect("Failed to issue token");
    (user.id, token)
}

pub async fn create_project(pool: &DbPool, admin_id: i32, name: &str) -> i32 {
    pool.create_project(admin_id, name)
        .await
        .expect("Failed to create project")
        .id
}

pub async fn assign(pool: &DbPool, admin_id: i32, project_id: i32, user_id: i32) {
    pool.assign_user_to_project(admin_id, project_id, user_id)
        .await
        .expect("Failed to assign user");
}

/// Minimal valid run payload with `steps` PASS steps.
pub fn run_payload(name: &str, status: &str, steps: usize) -> Value {
    let steps: Vec<Value> = (1..=steps)
        .map(|n| {
            json!({
                "step_number": n,
                "step_description": format!("step {}", n),
                "step_status": "PASS",
                "error_message": null,
                "timestamp": "2024-04-01T10:00:00Z",
            })
        })
        .collect();
    json!({
        "test_name": name,
        "status": status,
        "execution_time": 2.5,
        "timestamp": "2024-04-01T10:00:00Z",
        "steps": steps,
    })
}

pub async fn send<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn get_json<S>(app: &S, token: &str, uri: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    send(app, req).await
}

pub async fn post_json<S>(app: &S, token: &str, uri: &str, body: Value) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();
    send(app, req).await
}

pub async fn delete<S>(app: &S, token: &str, uri: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::delete()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    send(app, req).await
}

/// Submit a run and return its ID, asserting success.
pub async fn submit<S>(app: &S, token: &str, body: Value) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, resp) = post_json(app, token, "/submit-test-result/", body).await;
    assert_eq!(status, 200, "submit failed: {}", resp);
    resp["test_id"].as_i64().expect("test_id missing")
}

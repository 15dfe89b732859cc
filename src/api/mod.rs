//! API endpoint modules.

pub mod admin;
pub mod auth;
pub mod export;
pub mod health;
pub mod metrics;
pub mod openapi;
pub mod projects;
pub mod suites;
pub mod test_reports;

use actix_web::web;

use crate::error::AppError;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// JSON body decode failures become 400 with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

pub fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

/// Register every route plus the extractor configs.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(form_config())
        .app_data(path_config())
        .configure(configure_health_routes)
        .configure(auth::configure_routes)
        .configure(test_reports::configure_routes)
        .configure(metrics::configure_routes)
        .configure(projects::configure_routes)
        .configure(suites::configure_routes)
        .configure(admin::configure_routes)
        .configure(export::configure_routes)
        .service(openapi::openapi_json);
}

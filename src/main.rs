//! Run report server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use run_report_lib::api;
use run_report_lib::auth::TokenSigner;
use run_report_lib::config::Config;
use run_report_lib::db::DbPool;
use run_report_lib::middleware::RequestLogger;
use run_report_lib::services::export::SendGridMailer;

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static files are not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));
    cors.allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600)
}

fn startup_failure(message: impl std::fmt::Display) -> std::io::Error {
    error!("{}", message);
    std::io::Error::other(message.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Docker HEALTHCHECK: succeed when the configuration loads
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if Config::from_env().is_ok() { 0 } else { 1 });
    }

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and RRS_JWT_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Run Report Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = DbPool::new(&config.database)
        .await
        .map_err(|e| startup_failure(format!("Failed to initialize database: {}", e)))?;
    pool.run_migrations()
        .await
        .map_err(|e| startup_failure(format!("Failed to run migrations: {}", e)))?;
    info!("Database migrations complete");

    let signer = TokenSigner::new(config.jwt_secret.clone(), config.token_ttl_minutes);
    let mailer = SendGridMailer::new(&config.email)
        .map_err(|e| startup_failure(format!("Failed to set up e-mail delivery: {}", e)))?;
    if !mailer.is_configured() {
        warn!("SENDGRID_API_KEY is not set; e-mail export will fail");
    }

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let cors_origins = config.cors_origins.clone();

    if let Some(ref dir) = static_dir {
        info!("Static file serving enabled from {:?}", dir);
    }

    let worker_count = if config.is_development() {
        4
    } else {
        num_cpus::get()
    };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    let pool = web::Data::new(pool);
    let signer = web::Data::new(signer);
    let mailer = web::Data::new(mailer);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(build_cors(&cors_origins))
            .wrap(RequestLogger)
            .app_data(pool.clone())
            .app_data(signer.clone())
            .app_data(mailer.clone())
            .configure(api::configure_routes);

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .default_service(web::route().to(spa_fallback));
        }

        app
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}

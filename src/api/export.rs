//! Report export as JSON, PDF or e-mail.

use actix_web::{HttpResponse, http::header, web};
use tracing::info;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{ExportFormat, ExportQuery, MessageResponse};
use crate::services::export::{
    ATTACHMENT_NAME, SendGridMailer, email_body, email_subject, render_report, runs_to_json,
};

/// Export the caller's visible runs matching the filters.
#[utoipa::path(
    get,
    path = "/export-report/",
    tag = "Export",
    params(ExportQuery),
    responses(
        (status = 200, description = "JSON run list, PDF attachment, or e-mail confirmation"),
        (status = 400, description = "Unknown format, bad filter or missing recipient", body = crate::error::ErrorResponse),
        (status = 500, description = "E-mail delivery failed", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn export_report(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    mailer: web::Data<SendGridMailer>,
    query: web::Query<ExportQuery>,
) -> AppResult<HttpResponse> {
    let format = query.format()?;
    let filter = query.to_filter()?;
    let recipient = match format {
        ExportFormat::Email => Some(query.recipient()?),
        _ => None,
    };

    let runs = pool
        .list_test_reports(&filter, &auth.user.visibility())
        .await?;

    match format {
        ExportFormat::Json => Ok(HttpResponse::Ok().json(runs_to_json(&runs, query.detailed)?)),
        ExportFormat::Pdf => {
            let pdf = render_report(&runs, query.detailed);
            Ok(HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", ATTACHMENT_NAME),
                ))
                .body(pdf))
        }
        ExportFormat::Email => {
            let recipient = recipient.unwrap_or_default();
            let pdf = render_report(&runs, query.detailed);
            mailer
                .send_report(
                    recipient,
                    &email_subject(runs.len()),
                    &email_body(runs.len()),
                    &pdf,
                )
                .await?;
            info!(recipient = %recipient, runs = runs.len(), requested_by = %auth.user.username, "Report e-mailed");
            Ok(HttpResponse::Ok().json(MessageResponse::new("Email sent successfully.")))
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/export-report/").route(web::get().to(export_report)));
}

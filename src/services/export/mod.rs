//! Report export: JSON documents, PDF rendering and e-mail delivery.

mod email;
mod pdf;

pub use email::{ATTACHMENT_NAME, SendGridMailer};
pub use pdf::{render_report, strip_html_tags};

use serde_json::Value;

use crate::error::AppResult;
use crate::models::TestReportResponse;

/// Serialize runs for JSON export. Steps are dropped unless `detailed`.
pub fn runs_to_json(runs: &[TestReportResponse], detailed: bool) -> AppResult<Value> {
    let mut value = serde_json::to_value(runs)?;
    if !detailed && let Value::Array(items) = &mut value {
        for item in items {
            if let Value::Object(map) = item {
                map.remove("steps");
            }
        }
    }
    Ok(value)
}

pub fn email_subject(run_count: usize) -> String {
    format!("Test report ({} runs)", run_count)
}

pub fn email_body(run_count: usize) -> String {
    format!(
        "<p>Please find attached the test report covering {} run(s).</p>",
        run_count
    )
}

//! SeaORM entity definitions.

pub mod audit_log;
pub mod comment;
pub mod favorite_project;
pub mod project;
pub mod test_report;
pub mod test_step;
pub mod test_suite;
pub mod user;
pub mod user_project;

//! SeaORM database migrations.
//!
//! Written with the schema builder so the same migrations run against
//! PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_and_projects;
mod m20250301_000002_create_test_suites;
mod m20250301_000003_create_test_reports;
mod m20250301_000004_create_comments_and_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_and_projects::Migration),
            Box::new(m20250301_000002_create_test_suites::Migration),
            Box::new(m20250301_000003_create_test_reports::Migration),
            Box::new(m20250301_000004_create_comments_and_audit_logs::Migration),
        ]
    }
}

//! HTTP API test suite.
//!
//! Each test builds the full route table over a fresh in-memory SQLite
//! database migrated with the production migrator.
//!
//! Run with: cargo test --test api

mod helpers;

mod test_admin;
mod test_auth;
mod test_catalog;
mod test_export;
mod test_ingestion;
mod test_metrics;

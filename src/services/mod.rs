//! Report computation that runs in Rust over rows fetched from the database.

pub mod aggregation;
pub mod error_clustering;
pub mod export;

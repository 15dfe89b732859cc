//! Run report server library.
//!
//! Storage, HTTP API and report computation for automated test runs, plus the
//! client-side step reporter that submits runs to the server.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod reporter;
pub mod services;

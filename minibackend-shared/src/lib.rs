//! # Mini Backend Shared Library
//!
//! This crate contains the database access layer used by the mini backend API
//! server: pooled connections, scoped acquisition, the startup schema check,
//! query timing, and the customer model.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, scoped connections and transactions, schema check
//! - `perf`: query timing instrumentation
//! - `models`: database models and their queries

pub mod db;
pub mod models;
pub mod perf;

/// Current version of the mini backend shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

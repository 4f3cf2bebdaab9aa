//! # Mini Backend API Server Library
//!
//! This library provides the HTTP layer of the mini backend: customer CRUD
//! endpoints over the pooled database layer in `minibackend-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;

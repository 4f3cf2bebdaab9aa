/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `customers`: Customer list, lookup and creation

pub mod customers;
pub mod health;

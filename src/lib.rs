//! Precinct Desk library.
//!
//! This library provides the guided incident report workflow and the HTTP
//! server that hosts it, including database access, storage adapters,
//! session verification and API endpoints.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

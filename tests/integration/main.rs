//! HTTP integration tests.
//!
//! Run against in-memory adapters from the `test-support` feature; no
//! database or bucket is needed.
//!
//! Run with: cargo test --test integration

mod helpers;

mod auth_tests;
mod health_tests;
mod officers_tests;
mod reports_tests;
mod workflow_tests;

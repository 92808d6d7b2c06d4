//! Test utilities for the Portal API.
//!
//! Provides the E2E server harness and shared fixtures used by
//! `portal-service/tests/`.

pub mod fixtures;
pub mod server_harness;

pub use fixtures::{test_config, STRONG_PASSWORD};
pub use server_harness::TestPortalServer;

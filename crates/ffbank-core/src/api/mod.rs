//! REST API client module for the bank service.
//!
//! This module provides the `ApiClient` for logging in, registering
//! accounts and fetching balance and transfer data.
//!
//! Authenticated endpoints use a bearer token taken from an `AuthSession`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};

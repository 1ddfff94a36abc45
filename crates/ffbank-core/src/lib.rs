//! Core library for ffbank.
//!
//! Everything the front ends need to talk to the bank lives here:
//!
//! - `api`: REST client for the bank service (login, accounts, balance, transfers)
//! - `auth`: credential store, biometric gate, session bootstrap state machine
//! - `storage`: key-value backends used by the credential store
//! - `models`: wire and domain types
//! - `registration`: account sign-up form validation
//! - `dashboard`: balance and transaction loading for a signed-in user
//! - `config`: persisted application settings
//! - `utils`: CPF, currency and date formatting

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod registration;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthSession, BiometricGate, CredentialStore, SessionBootstrapper};
pub use config::Config;

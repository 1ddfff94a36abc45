//! Authentication module for sessions, saved credentials and biometric unlock.
//!
//! This module provides:
//! - `CredentialStore`: saved nickname/password and the biometric opt-in flag
//! - `BiometricGate`: fingerprint reader capability and challenge
//! - `SessionBootstrapper`: startup decision between silent and manual login
//! - `AuthSession`: the in-memory result of a login
//!
//! Sessions are never written to disk; a new launch starts from the
//! bootstrapper again.

pub mod biometric;
pub mod bootstrap;
pub mod credentials;
pub mod session;

pub use biometric::{
    platform_gate, BiometricAvailability, BiometricError, BiometricGate, ChallengeOptions,
    ChallengeOutcome,
};
pub use bootstrap::{
    Alert, Authenticator, BootstrapState, LoginError, ManualInputReason, OptInOutcome,
    SessionBootstrapper, StartupOutcome,
};
pub use credentials::{BiometricFlag, CredentialStore, StoredCredential};
pub use session::{AuthSession, LoginMethod};

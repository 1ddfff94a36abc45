//! Session bootstrap: how the app gets from "just started" to "signed in".
//!
//! ```text
//! Init -> CheckingBiometricFlag -> SilentLoginAttempt  -> Authenticated
//!                               \-> AwaitingManualInput -> Authenticated
//! ```
//!
//! On start the biometric flag decides the path. With the flag enabled and a
//! saved nickname/password pair, one biometric challenge releases the saved
//! credentials for a login. Everything else lands in `AwaitingManualInput`,
//! which is a normal resting state rather than an error. Storage read failures
//! are logged and treated as absent values. Nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResult};
use crate::config::CredentialPersistence;

use super::biometric::{BiometricError, BiometricGate, ChallengeOptions};
use super::credentials::{BiometricFlag, CredentialStore, StoredCredential};
use super::session::{AuthSession, LoginMethod};

/// Alert shown when the startup biometric challenge does not succeed
pub const BIOMETRIC_FAILED_MESSAGE: &str = "Biometric authentication failed.";

/// Alert shown when the opt-in passed but could not be written to storage
pub const NOT_SAVED_MESSAGE: &str = "Could not save the fingerprint setting.";

/// Exchanges a nickname/password pair for a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        nickname: &str,
        password: &str,
        method: LoginMethod,
    ) -> ApiResult<AuthSession>;
}

/// Where the bootstrap flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Init,
    CheckingBiometricFlag,
    SilentLoginAttempt,
    AwaitingManualInput,
    Authenticated,
}

/// A blocking, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }
}

/// Why the app is waiting for the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualInputReason {
    /// No biometric decision recorded yet
    FirstRun,
    BiometricDisabled,
    /// Flag enabled but nickname or password missing
    MissingCredentials,
    ChallengeFailed,
    /// Challenge passed but the API refused or could not be reached
    LoginFailed,
    LoggedOut,
}

/// Result of `SessionBootstrapper::start`.
#[derive(Debug)]
pub enum StartupOutcome {
    Authenticated(AuthSession),
    AwaitingManualInput {
        reason: ManualInputReason,
        alert: Option<Alert>,
    },
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Nickname and password required")]
    MissingFields,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LoginError {
    pub fn alert(&self) -> Alert {
        match self {
            LoginError::MissingFields => Alert::error(self.to_string()),
            LoginError::Api(e) => Alert::error(e.user_message()),
        }
    }
}

/// Result of the dashboard biometric opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptInOutcome {
    Enabled,
    /// No reader or nothing enrolled
    Unavailable(BiometricError),
    /// The one-off challenge did not succeed; nothing recorded
    ChallengeFailed,
    /// The challenge passed but the setting could not be written
    NotSaved,
}

impl OptInOutcome {
    /// Alert to show, if any. A failed challenge is silent.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            OptInOutcome::Unavailable(e) => Some(Alert::new("Biometrics", e.to_string())),
            OptInOutcome::NotSaved => Some(Alert::new("Biometrics", NOT_SAVED_MESSAGE)),
            OptInOutcome::Enabled | OptInOutcome::ChallengeFailed => None,
        }
    }
}

pub struct SessionBootstrapper {
    credentials: CredentialStore,
    gate: Arc<dyn BiometricGate>,
    authenticator: Arc<dyn Authenticator>,
    persistence: CredentialPersistence,
    challenge_options: ChallengeOptions,
    state: BootstrapState,
    transitions: Vec<BootstrapState>,
    /// Manual login held back until biometrics are enabled
    pending: Option<StoredCredential>,
}

impl SessionBootstrapper {
    pub fn new(
        credentials: CredentialStore,
        gate: Arc<dyn BiometricGate>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            credentials,
            gate,
            authenticator,
            persistence: CredentialPersistence::default(),
            challenge_options: ChallengeOptions::default(),
            state: BootstrapState::Init,
            transitions: vec![BootstrapState::Init],
            pending: None,
        }
    }

    pub fn with_persistence(mut self, persistence: CredentialPersistence) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_challenge_options(mut self, options: ChallengeOptions) -> Self {
        self.challenge_options = options;
        self
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Every state entered so far, oldest first
    pub fn transitions(&self) -> &[BootstrapState] {
        &self.transitions
    }

    pub fn challenge_options(&self) -> &ChallengeOptions {
        &self.challenge_options
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn transition(&mut self, next: BootstrapState) {
        debug!(from = ?self.state, to = ?next, "Bootstrap transition");
        self.state = next;
        self.transitions.push(next);
    }

    fn awaiting_manual(&mut self, reason: ManualInputReason, alert: Option<Alert>) -> StartupOutcome {
        self.transition(BootstrapState::AwaitingManualInput);
        info!(?reason, alerted = alert.is_some(), "Waiting for manual login");
        StartupOutcome::AwaitingManualInput { reason, alert }
    }

    fn authenticated(&mut self, session: AuthSession) -> AuthSession {
        self.transition(BootstrapState::Authenticated);
        session
    }

    /// Read the flag, treating a storage failure as "nothing recorded".
    fn read_flag(&self) -> BiometricFlag {
        self.credentials.biometric_flag().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read biometric flag");
            BiometricFlag::Unset
        })
    }

    /// Run the startup decision once, at app launch.
    pub async fn start(&mut self) -> StartupOutcome {
        self.transition(BootstrapState::CheckingBiometricFlag);

        match self.read_flag() {
            BiometricFlag::Unset => self.awaiting_manual(ManualInputReason::FirstRun, None),
            BiometricFlag::Disabled => {
                self.awaiting_manual(ManualInputReason::BiometricDisabled, None)
            }
            BiometricFlag::Enabled => self.silent_login().await,
        }
    }

    async fn silent_login(&mut self) -> StartupOutcome {
        self.transition(BootstrapState::SilentLoginAttempt);

        let saved = match self.credentials.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => {
                debug!("Biometric login enabled but no saved credentials");
                return self.awaiting_manual(ManualInputReason::MissingCredentials, None);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read saved credentials");
                return self.awaiting_manual(ManualInputReason::MissingCredentials, None);
            }
        };

        let outcome = self.gate.challenge(&self.challenge_options).await;
        if !outcome.is_success() {
            info!(?outcome, "Startup biometric challenge did not succeed");
            return self.awaiting_manual(
                ManualInputReason::ChallengeFailed,
                Some(Alert::new("Biometrics", BIOMETRIC_FAILED_MESSAGE)),
            );
        }

        let login = self
            .authenticator
            .authenticate(&saved.nickname, &saved.password, LoginMethod::Biometric)
            .await;

        match login {
            Ok(session) => StartupOutcome::Authenticated(self.authenticated(session)),
            Err(e) => {
                warn!(error = %e, "Login with saved credentials failed");
                self.awaiting_manual(
                    ManualInputReason::LoginFailed,
                    Some(Alert::error(e.user_message())),
                )
            }
        }
    }

    /// Log in with a nickname and password typed by the user.
    ///
    /// On success the pair is saved according to the persistence policy;
    /// a failed write is logged and does not affect the login.
    pub async fn submit_manual(
        &mut self,
        nickname: &str,
        password: &str,
    ) -> Result<AuthSession, LoginError> {
        let nickname = nickname.trim();
        if nickname.is_empty() || password.is_empty() {
            return Err(LoginError::MissingFields);
        }

        let session = self
            .authenticator
            .authenticate(nickname, password, LoginMethod::Manual)
            .await?;

        let persist_now = match self.persistence {
            CredentialPersistence::Always => true,
            CredentialPersistence::WhenBiometricEnabled => self.read_flag().is_enabled(),
        };

        if persist_now {
            self.pending = None;
            if let Err(e) = self.credentials.store(nickname, password) {
                warn!(error = %e, "Failed to save credentials");
            }
        } else {
            debug!("Holding credentials until biometrics are enabled");
            self.pending = Some(StoredCredential {
                nickname: nickname.to_string(),
                password: password.to_string(),
                biometric_enabled: false,
            });
        }

        Ok(self.authenticated(session))
    }

    /// Whether the dashboard should offer biometric unlock.
    /// Only while no decision has been recorded.
    pub fn should_offer_biometrics(&self) -> bool {
        matches!(self.read_flag(), BiometricFlag::Unset)
    }

    /// Opt into biometric unlock for future launches.
    pub async fn enable_biometrics(&mut self) -> OptInOutcome {
        if let Err(e) = self.gate.ensure_ready().await {
            info!(error = %e, "Biometric opt-in unavailable");
            return OptInOutcome::Unavailable(e);
        }

        let outcome = self.gate.challenge(&self.challenge_options).await;
        if !outcome.is_success() {
            info!(?outcome, "Biometric opt-in challenge did not succeed");
            return OptInOutcome::ChallengeFailed;
        }

        if let Some(pending) = self.pending.take() {
            if let Err(e) = self.credentials.store(&pending.nickname, &pending.password) {
                warn!(error = %e, "Failed to save credentials");
                self.pending = Some(pending);
                return OptInOutcome::NotSaved;
            }
        }

        if let Err(e) = self.credentials.set_biometric_enabled(true) {
            warn!(error = %e, "Failed to save biometric flag");
            return OptInOutcome::NotSaved;
        }
        info!("Biometric unlock enabled");
        OptInOutcome::Enabled
    }

    /// Record that the user does not want biometric unlock.
    pub fn decline_biometrics(&mut self) {
        self.pending = None;
        if let Err(e) = self.credentials.set_biometric_enabled(false) {
            warn!(error = %e, "Failed to save biometric flag");
        }
    }

    /// End the session. Saved credentials and the flag are kept.
    pub fn logout(&mut self, session: AuthSession) -> ManualInputReason {
        info!(nickname = session.nickname(), "Logged out");
        drop(session);
        self.pending = None;
        self.transition(BootstrapState::AwaitingManualInput);
        ManualInputReason::LoggedOut
    }
}

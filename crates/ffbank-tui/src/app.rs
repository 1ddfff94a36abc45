//! Application state management for the FFBank terminal client.
//!
//! This module contains the `App` struct that owns the session bootstrapper,
//! the signed-in session, dashboard data and all UI state (login form,
//! overlays, alert queue, selection).

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use ffbank_core::auth::{
    platform_gate, Alert, AuthSession, BiometricGate, CredentialStore, ManualInputReason,
    OptInOutcome, SessionBootstrapper, StartupOutcome,
};
use ffbank_core::dashboard::DashboardData;
use ffbank_core::models::Transaction;
use ffbank_core::{ApiClient, Config};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for nickname input.
const MAX_NICKNAME_LENGTH: usize = 50;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

const FINGERPRINT_HINT: &str = "touch the fingerprint reader";

const LOGIN_HEADING: &str = "Sign in to FFBank";

// ============================================================================
// UI State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    /// Dashboard (or an empty screen when signed out)
    Normal,
    ShowingHelp,
    LoggingIn,
    /// Asking whether to unlock with a fingerprint next time
    OfferingBiometrics,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Nickname,
    Password,
    Button,
}

/// Work that waits on the network or the fingerprint reader.
///
/// Queued by input handlers and run by the main loop right after the next
/// draw, so `busy_message` is on screen for the whole wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingAction {
    Startup,
    ManualLogin,
    LoadDashboard,
    EnableBiometrics,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub state: AppState,
    pub config: Config,
    api: ApiClient,
    gate: Arc<dyn BiometricGate>,
    bootstrapper: SessionBootstrapper,

    pub session: Option<AuthSession>,
    pub dashboard: DashboardData,
    pub selection: usize,

    // Login form
    /// Form title; the challenge fallback label after a failed fingerprint
    pub login_heading: String,
    pub login_nickname: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    /// Shown one at a time, oldest first; any key dismisses
    pub alerts: VecDeque<Alert>,
    pub status_message: Option<String>,
    pub busy_message: Option<String>,
    pending: Option<PendingAction>,
    /// Check the opt-in offer after the next dashboard load
    offer_check_due: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url())?;
        let gate = platform_gate(&config);
        let credentials = CredentialStore::new(config.open_store());
        let bootstrapper =
            SessionBootstrapper::new(credentials, gate.clone(), Arc::new(api.clone()))
                .with_persistence(config.credential_persistence);

        info!(api = api.base_url(), "App initialized");
        Ok(Self::with_parts(config, api, gate, bootstrapper))
    }

    pub fn with_parts(
        config: Config,
        api: ApiClient,
        gate: Arc<dyn BiometricGate>,
        bootstrapper: SessionBootstrapper,
    ) -> Self {
        Self {
            state: AppState::Normal,
            config,
            api,
            gate,
            bootstrapper,
            session: None,
            dashboard: DashboardData::default(),
            selection: 0,
            login_heading: LOGIN_HEADING.to_string(),
            login_nickname: String::new(),
            login_password: String::new(),
            login_focus: LoginFocus::Nickname,
            login_error: None,
            alerts: VecDeque::new(),
            status_message: None,
            busy_message: None,
            pending: None,
            offer_check_due: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    // =========================================================================
    // Pending work
    // =========================================================================

    fn queue(&mut self, action: PendingAction, busy: impl Into<String>) {
        debug!(?action, "Queued");
        self.pending = Some(action);
        self.busy_message = Some(busy.into());
    }

    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub async fn run_pending(&mut self, action: PendingAction) {
        match action {
            PendingAction::Startup => self.run_startup().await,
            PendingAction::ManualLogin => self.run_manual_login().await,
            PendingAction::LoadDashboard => self.run_load_dashboard().await,
            PendingAction::EnableBiometrics => self.run_enable_biometrics().await,
        }
        // A follow-up action keeps its own busy message
        if self.pending.is_none() {
            self.busy_message = None;
        }
    }

    fn fingerprint_prompt(&self) -> String {
        format!("{}: {}", self.bootstrapper.challenge_options().prompt, FINGERPRINT_HINT)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Queue the startup decision. Call once at launch.
    pub fn begin_startup(&mut self) {
        // Only a saved pair with the flag on leads to a fingerprint challenge
        let biometric = match self.bootstrapper.credentials().load() {
            Ok(saved) => saved.is_some_and(|c| c.biometric_enabled),
            Err(e) => {
                warn!(error = %e, "Failed to read saved credentials");
                false
            }
        };
        let busy = if biometric {
            self.fingerprint_prompt()
        } else {
            "Starting...".to_string()
        };
        self.queue(PendingAction::Startup, busy);
    }

    async fn run_startup(&mut self) {
        match self.bootstrapper.start().await {
            StartupOutcome::Authenticated(session) => self.on_signed_in(session),
            StartupOutcome::AwaitingManualInput { reason, alert } => {
                debug!(?reason, "Startup needs manual login");
                if let Some(alert) = alert {
                    self.alerts.push_back(alert);
                }
                if matches!(
                    reason,
                    ManualInputReason::ChallengeFailed | ManualInputReason::LoginFailed
                ) {
                    self.login_heading =
                        self.bootstrapper.challenge_options().fallback_label.clone();
                }
                self.start_login();
            }
        }
    }

    /// Show the login form, prefilled with the last nickname used.
    pub fn start_login(&mut self) {
        if self.login_nickname.is_empty() {
            self.login_nickname = self
                .config
                .last_nickname
                .clone()
                .or_else(|| self.bootstrapper.credentials().nickname().ok().flatten())
                .unwrap_or_default();
        }
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_nickname.is_empty() {
            LoginFocus::Nickname
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub fn submit_login(&mut self) {
        self.login_error = None;
        self.queue(PendingAction::ManualLogin, "Signing in...");
    }

    async fn run_manual_login(&mut self) {
        let result = self
            .bootstrapper
            .submit_manual(&self.login_nickname, &self.login_password)
            .await;

        match result {
            Ok(session) => self.on_signed_in(session),
            Err(e) => {
                warn!(error = %e, "Manual login failed");
                self.login_error = Some(e.alert().message);
                self.login_focus = LoginFocus::Password;
            }
        }
    }

    fn on_signed_in(&mut self, session: AuthSession) {
        let nickname = session.nickname().to_string();
        if self.config.last_nickname.as_deref() != Some(nickname.as_str()) {
            self.config.last_nickname = Some(nickname.clone());
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }

        self.status_message = Some(session.signed_in_display());
        self.session = Some(session);
        self.login_nickname = nickname;
        self.login_password.clear();
        self.login_error = None;
        self.login_heading = LOGIN_HEADING.to_string();
        self.state = AppState::Normal;
        self.offer_check_due = true;
        self.queue(PendingAction::LoadDashboard, "Loading your account...");
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            let reason = self.bootstrapper.logout(session);
            debug!(?reason, "Session ended");
        }
        self.dashboard = DashboardData::default();
        self.selection = 0;
        self.offer_check_due = false;
        self.status_message = Some("Logged out".to_string());
        self.start_login();
    }

    // =========================================================================
    // Biometric opt-in
    // =========================================================================

    /// Offer fingerprint unlock when nothing has been decided and a reader exists.
    async fn maybe_offer_biometrics(&mut self) {
        if !self.bootstrapper.should_offer_biometrics() {
            return;
        }
        match self.gate.check_availability().await {
            Ok(availability) if availability.has_hardware => {
                self.state = AppState::OfferingBiometrics;
            }
            Ok(_) => debug!("No fingerprint reader, not offering biometrics"),
            Err(e) => warn!(error = %e, "Could not check fingerprint reader"),
        }
    }

    pub fn accept_biometrics(&mut self) {
        self.state = AppState::Normal;
        let busy = self.fingerprint_prompt();
        self.queue(PendingAction::EnableBiometrics, busy);
    }

    pub fn decline_biometrics(&mut self) {
        self.bootstrapper.decline_biometrics();
        self.state = AppState::Normal;
        self.status_message = Some("Fingerprint unlock not enabled".to_string());
    }

    async fn run_enable_biometrics(&mut self) {
        let outcome = self.bootstrapper.enable_biometrics().await;
        if let Some(alert) = outcome.alert() {
            self.alerts.push_back(alert);
        }
        if outcome == OptInOutcome::Enabled {
            self.status_message = Some("Fingerprint unlock enabled".to_string());
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub fn refresh(&mut self) {
        if self.is_authenticated() {
            self.queue(PendingAction::LoadDashboard, "Updating...");
        }
    }

    async fn run_load_dashboard(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let mut data = DashboardData::load(&self.api, session).await;
        self.alerts.extend(data.alerts.drain(..));
        self.dashboard = data;
        self.selection = self
            .selection
            .min(self.dashboard.transactions.len().saturating_sub(1));

        if self.offer_check_due {
            self.offer_check_due = false;
            self.maybe_offer_biometrics().await;
        }
    }

    /// Name shown in the dashboard greeting
    pub fn greeting_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user().display_name())
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.dashboard.transactions.get(self.selection)
    }

    pub fn select_next(&mut self, step: usize) {
        let max = self.dashboard.transactions.len().saturating_sub(1);
        self.selection = self.selection.saturating_add(step).min(max);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    pub fn show_selected_details(&mut self) {
        if let Some(details) = self.selected_transaction().map(|t| t.details()) {
            self.alerts.push_back(Alert::new("Details", details));
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_nickname_char(current_len: usize, c: char) -> bool {
    current_len < MAX_NICKNAME_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use ffbank_core::auth::biometric::UnsupportedGate;
    use ffbank_core::auth::{
        BiometricAvailability, BiometricError, BiometricFlag, ChallengeOptions, ChallengeOutcome,
        LoginMethod,
    };
    use ffbank_core::models::{Counterparty, User};
    use ffbank_core::storage::{KeyValueStore, MemoryStore, StoreError, StoreResult};

    /// Enrolled reader that accepts every touch
    struct AlwaysPassGate;

    #[async_trait]
    impl BiometricGate for AlwaysPassGate {
        async fn check_availability(&self) -> Result<BiometricAvailability, BiometricError> {
            Ok(BiometricAvailability {
                has_hardware: true,
                is_enrolled: true,
            })
        }

        async fn challenge(&self, _options: &ChallengeOptions) -> ChallengeOutcome {
            ChallengeOutcome::Success
        }
    }

    /// Reads nothing back and refuses every write
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
        fn remove(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
    }

    fn test_app() -> App {
        let config = Config {
            last_nickname: None,
            ..Default::default()
        };
        // Nothing in these tests reaches the network
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let gate: Arc<dyn BiometricGate> = Arc::new(UnsupportedGate);
        let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
        let bootstrapper = SessionBootstrapper::new(credentials, gate.clone(), Arc::new(api.clone()));
        App::with_parts(config, api, gate, bootstrapper)
    }

    fn transaction(id: i64, kind: &str) -> Transaction {
        Transaction {
            id,
            category: "pix".to_string(),
            counterparty: Counterparty {
                nickname: "ana".to_string(),
                name: "Ana".to_string(),
            },
            date: "2025-03-07".to_string(),
            description: format!("Transfer {}", id),
            kind: kind.to_string(),
            amount: 10.0,
        }
    }

    fn session() -> AuthSession {
        let user = User {
            name: "Felipe".to_string(),
            ..Default::default()
        };
        AuthSession::new("tok".to_string(), user, "felipe", LoginMethod::Manual)
    }

    async fn run_all(app: &mut App) {
        while let Some(action) = app.take_pending() {
            app.run_pending(action).await;
        }
    }

    #[tokio::test]
    async fn test_first_run_shows_login() {
        let mut app = test_app();
        app.begin_startup();
        assert_eq!(app.busy_message.as_deref(), Some("Starting..."));

        run_all(&mut app).await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_focus, LoginFocus::Nickname);
        assert!(app.alerts.is_empty());
        assert!(app.busy_message.is_none());
    }

    #[tokio::test]
    async fn test_failed_startup_challenge_alerts_and_prefills() {
        let mut app = test_app();
        let credentials = app.bootstrapper.credentials();
        credentials.store("felipe", "senha123").unwrap();
        credentials.set_biometric_enabled(true).unwrap();

        app.begin_startup();
        assert!(app
            .busy_message
            .as_deref()
            .is_some_and(|m| m.contains(FINGERPRINT_HINT)));

        run_all(&mut app).await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_nickname, "felipe");
        assert_eq!(app.login_focus, LoginFocus::Password);
        let alert = app.alerts.front().unwrap();
        assert_eq!(alert.message, "Biometric authentication failed.");
        assert_eq!(app.login_heading, "Use password");
        assert!(app.session.is_none());
    }

    #[tokio::test]
    async fn test_flag_without_saved_login_skips_fingerprint_prompt() {
        let mut app = test_app();
        app.bootstrapper.credentials().set_biometric_enabled(true).unwrap();

        app.begin_startup();
        assert_eq!(app.busy_message.as_deref(), Some("Starting..."));

        run_all(&mut app).await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_heading, LOGIN_HEADING);
        assert!(app.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_opt_in_that_cannot_be_saved_is_not_reported_enabled() {
        let config = Config::default();
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let gate: Arc<dyn BiometricGate> = Arc::new(AlwaysPassGate);
        let credentials = CredentialStore::new(Arc::new(ReadOnlyStore));
        let bootstrapper = SessionBootstrapper::new(credentials, gate.clone(), Arc::new(api.clone()));
        let mut app = App::with_parts(config, api, gate, bootstrapper);

        app.accept_biometrics();
        run_all(&mut app).await;

        assert_ne!(app.status_message.as_deref(), Some("Fingerprint unlock enabled"));
        let alert = app.alerts.front().unwrap();
        assert_eq!(alert.message, "Could not save the fingerprint setting.");
    }

    #[tokio::test]
    async fn test_empty_login_shows_error() {
        let mut app = test_app();
        app.start_login();
        app.submit_login();
        run_all(&mut app).await;

        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some("Nickname and password required"));
    }

    #[test]
    fn test_decline_records_choice() {
        let mut app = test_app();
        app.state = AppState::OfferingBiometrics;
        app.decline_biometrics();

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(
            app.bootstrapper.credentials().biometric_flag().unwrap(),
            BiometricFlag::Disabled
        );
    }

    #[tokio::test]
    async fn test_opt_in_without_reader_alerts() {
        let mut app = test_app();
        app.accept_biometrics();
        run_all(&mut app).await;

        let alert = app.alerts.front().unwrap();
        assert_eq!(alert.message, "Biometrics not supported");
        assert_eq!(
            app.bootstrapper.credentials().biometric_flag().unwrap(),
            BiometricFlag::Unset
        );
    }

    #[test]
    fn test_logout_returns_to_login() {
        let mut app = test_app();
        app.session = Some(session());
        app.dashboard.transactions = vec![transaction(1, "recebida")];
        app.selection = 0;

        app.logout();
        assert!(app.session.is_none());
        assert!(app.dashboard.transactions.is_empty());
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.status_message.as_deref(), Some("Logged out"));
    }

    #[test]
    fn test_selection_and_details() {
        let mut app = test_app();
        app.dashboard.transactions = vec![
            transaction(1, "recebida"),
            transaction(2, "enviada"),
            transaction(3, "enviada"),
        ];

        app.select_next(1);
        assert_eq!(app.selection, 1);
        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 2);
        app.select_prev(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 0);

        app.show_selected_details();
        let alert = app.alerts.front().unwrap();
        assert_eq!(alert.title, "Details");
        assert!(alert.message.starts_with("Transaction: Transfer 1"));

        app.dismiss_alert();
        assert!(app.alerts.is_empty());
    }

    #[test]
    fn test_details_with_no_transactions() {
        let mut app = test_app();
        app.show_selected_details();
        assert!(app.alerts.is_empty());
    }

    #[test]
    fn test_refresh_requires_session() {
        let mut app = test_app();
        app.refresh();
        assert!(app.take_pending().is_none());

        app.session = Some(session());
        app.refresh();
        assert_eq!(app.take_pending(), Some(PendingAction::LoadDashboard));
    }

    #[test]
    fn test_can_add_nickname_char() {
        assert!(can_add_nickname_char(0, 'a'));
        assert!(can_add_nickname_char(49, 'z'));
        assert!(!can_add_nickname_char(50, 'a'));
        assert!(!can_add_nickname_char(0, ' '));
        assert!(!can_add_nickname_char(0, '\n'));
        assert!(!can_add_nickname_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        assert!(!can_add_password_char(0, '\r'));
    }
}

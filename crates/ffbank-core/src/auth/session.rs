use chrono::{DateTime, Local, Utc};

use crate::models::User;

/// How the session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    /// Nickname and password typed by the user
    Manual,
    /// Saved credentials released by a biometric challenge
    Biometric,
}

/// An authenticated session.
///
/// Only ever held in memory. It is created by a successful login and handed
/// to whatever needs the token; `SessionBootstrapper::logout` consumes it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: String,
    user: User,
    nickname: String,
    method: LoginMethod,
    created_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(token: String, user: User, nickname: &str, method: LoginMethod) -> Self {
        Self {
            token,
            user,
            nickname: nickname.to_string(),
            method,
            created_at: Utc::now(),
        }
    }

    /// Bearer token for API requests
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Nickname the session was opened with
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn method(&self) -> LoginMethod {
        self.method
    }

    /// Status line text, e.g. `Signed in with fingerprint at 14:05`
    pub fn signed_in_display(&self) -> String {
        let at = self.created_at.with_timezone(&Local).format("%H:%M");
        match self.method {
            LoginMethod::Manual => format!("Signed in at {}", at),
            LoginMethod::Biometric => format!("Signed in with fingerprint at {}", at),
        }
    }
}

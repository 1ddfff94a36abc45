//! Account sign-up.
//!
//! `RegistrationForm` collects the raw field values, masks the CPF as it is
//! entered, and validates everything before `POST /contas`.

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::models::NewAccount;
use crate::utils::{format_cpf, is_valid_cpf_format};

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Invalid CPF. Use the format: 123.456.789-00")]
    InvalidCpf,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    cpf: String,
    pub nickname: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CPF from raw input, applying the `XXX.XXX.XXX-XX` mask
    pub fn set_cpf(&mut self, input: &str) {
        self.cpf = format_cpf(input);
    }

    pub fn cpf(&self) -> &str {
        &self.cpf
    }

    /// Check the form in the order the user sees the messages.
    pub fn validate(&self) -> Result<NewAccount, RegistrationError> {
        let fields = [
            &self.name,
            &self.cpf,
            &self.nickname,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(RegistrationError::MissingFields);
        }

        if !is_valid_cpf_format(&self.cpf) {
            return Err(RegistrationError::InvalidCpf);
        }

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RegistrationError::PasswordTooShort);
        }

        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        Ok(NewAccount {
            name: self.name.trim().to_string(),
            cpf: self.cpf.clone(),
            nickname: self.nickname.trim().to_string(),
            password: self.password.clone(),
        })
    }

    /// Validate and create the account. Returns the created account's payload.
    pub async fn submit(&self, api: &ApiClient) -> Result<NewAccount, RegistrationError> {
        let account = self.validate()?;
        api.register(&account).await?;
        Ok(account)
    }
}

/// Confirmation text after a successful sign-up
pub fn success_message(nickname: &str) -> String {
    format!("User {} registered successfully!", nickname)
}

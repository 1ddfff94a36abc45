//! Account holder types: the signed-in user, the login exchange and the
//! sign-up payload.

use serde::{Deserialize, Serialize};

/// The account holder returned alongside a login token.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "apelido", default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
}

impl User {
    /// Name to greet the user with, falling back to the nickname.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else {
            self.nickname.as_deref().unwrap_or("")
        }
    }
}

/// Body of `POST /login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub apelido: &'a str,
    pub senha: &'a str,
}

/// Response of `POST /login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    #[serde(rename = "usuario", default)]
    pub user: User,
}

/// A validated sign-up request, ready for `POST /contas`.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    #[serde(rename = "nome")]
    pub name: String,
    pub cpf: String,
    #[serde(rename = "apelido")]
    pub nickname: String,
    #[serde(rename = "senha")]
    pub password: String,
}

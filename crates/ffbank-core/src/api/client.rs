//! API client for communicating with the bank REST API.
//!
//! This module provides the `ApiClient` struct for logging in, creating
//! accounts and reading the balance and transfer history of a session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::auth::{AuthSession, Authenticator, LoginMethod};
use crate::models::{Balance, LoginRequest, LoginResponse, NewAccount, Transaction};

use super::error::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/login";
const ACCOUNTS_PATH: &str = "/contas";
const BALANCE_PATH: &str = "/contas/saldo";
const TRANSFERS_PATH: &str = "/transferencias";

/// API client for the bank service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(token: Option<&str>) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "Request rejected");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .headers(Self::auth_headers(Some(token))?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Response> {
        let response = self
            .client
            .post(self.url(path))
            .headers(Self::auth_headers(None)?)
            .json(body)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Log in and open a session
    pub async fn authenticate(
        &self,
        nickname: &str,
        password: &str,
        method: LoginMethod,
    ) -> ApiResult<AuthSession> {
        let body = LoginRequest {
            apelido: nickname,
            senha: password,
        };
        let response = self.post(LOGIN_PATH, &body).await?;
        let login: LoginResponse = Self::parse(response, "login response").await?;

        info!(nickname, ?method, "Logged in");
        Ok(AuthSession::new(login.token, login.user, nickname, method))
    }

    /// Create a new account (`POST /contas`)
    pub async fn register(&self, account: &NewAccount) -> ApiResult<()> {
        self.post(ACCOUNTS_PATH, account).await?;
        info!(nickname = %account.nickname, "Account created");
        Ok(())
    }

    // ===== Data Fetching Methods =====

    /// Fetch the account balance of the signed-in user
    pub async fn fetch_balance(&self, session: &AuthSession) -> ApiResult<Balance> {
        self.get(BALANCE_PATH, session.token()).await
    }

    /// Fetch the transfer history of the signed-in user
    pub async fn fetch_transactions(&self, session: &AuthSession) -> ApiResult<Vec<Transaction>> {
        self.get(TRANSFERS_PATH, session.token()).await
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn authenticate(
        &self,
        nickname: &str,
        password: &str,
        method: LoginMethod,
    ) -> ApiResult<AuthSession> {
        ApiClient::authenticate(self, nickname, password, method).await
    }
}

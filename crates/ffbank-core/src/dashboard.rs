//! Balance and transaction history for a signed-in user.

use chrono::{DateTime, Local, Utc};
use tracing::{debug, error};

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::auth::{Alert, AuthSession};
use crate::models::{Balance, Transaction};

const BALANCE_FAILED_MESSAGE: &str = "Could not load your balance";
const TRANSACTIONS_FAILED_MESSAGE: &str = "Could not load your transactions";

/// Shown in place of an empty transaction list
pub const NO_TRANSACTIONS_MESSAGE: &str = "No transactions found";

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    /// `None` when the balance could not be loaded
    pub balance: Option<Balance>,
    pub transactions: Vec<Transaction>,
    /// One alert per part that failed to load
    pub alerts: Vec<Alert>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DashboardData {
    /// Load balance and transactions together.
    pub async fn load(api: &ApiClient, session: &AuthSession) -> Self {
        let (balance, transactions) = futures::join!(
            api.fetch_balance(session),
            api.fetch_transactions(session)
        );
        Self::from_results(balance, transactions)
    }

    /// `Updated 14:05`, in local time, once something has been loaded
    pub fn updated_display(&self) -> Option<String> {
        self.loaded_at
            .map(|at| format!("Updated {}", at.with_timezone(&Local).format("%H:%M")))
    }

    /// Combine the two fetch results; a failure in one part keeps the other.
    pub fn from_results(
        balance: ApiResult<Balance>,
        transactions: ApiResult<Vec<Transaction>>,
    ) -> Self {
        let mut data = DashboardData {
            loaded_at: Some(Utc::now()),
            ..Default::default()
        };

        match balance {
            Ok(balance) => data.balance = Some(balance),
            Err(e) => {
                error!(error = %e, "Failed to fetch balance");
                data.alerts.push(failure_alert(&e, BALANCE_FAILED_MESSAGE));
            }
        }

        match transactions {
            Ok(transactions) => {
                debug!(count = transactions.len(), "Transactions loaded");
                data.transactions = transactions;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch transactions");
                data.alerts.push(failure_alert(&e, TRANSACTIONS_FAILED_MESSAGE));
            }
        }

        data
    }
}

/// Server message when the API gave one, otherwise the generic text.
fn failure_alert(e: &ApiError, generic: &str) -> Alert {
    match e {
        ApiError::Rejected { message, .. } => Alert::error(message.clone()),
        _ => Alert::error(generic),
    }
}

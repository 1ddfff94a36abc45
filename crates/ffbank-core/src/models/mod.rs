//! Data models for bank entities.
//!
//! - `User`, `NewAccount`: account holder and sign-up payload
//! - `Balance`, `Transaction`: dashboard data
//!
//! Wire field names are Portuguese (`nome`, `apelido`, `valor`, ...); the
//! Rust fields are renamed through serde.

pub mod account;
pub mod transaction;

pub use account::{NewAccount, User};
pub(crate) use account::{LoginRequest, LoginResponse};
pub use transaction::{Balance, Counterparty, Direction, Transaction};

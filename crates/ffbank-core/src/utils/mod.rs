//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_cpf, format_currency, format_date, initial, is_valid_cpf_format, truncate_string};

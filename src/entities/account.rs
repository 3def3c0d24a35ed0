// 💳 Account Entity - named money-holding bucket with a running balance
//
// The balance is never recomputed during normal operation: it starts at the
// opening balance and only moves by the delta of each recorded transaction.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

pub type AccountId = i64;

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Row id assigned by the store
    pub id: AccountId,

    /// Unique, case-sensitive, trimmed name (e.g., "Checking")
    pub name: String,

    /// Current balance (opening balance plus every transaction delta)
    pub balance: f64,

    /// Balance the account was created with
    pub opening_balance: f64,
}

impl Account {
    /// Net movement since the account was opened
    pub fn balance_change(&self) -> f64 {
        self.balance - self.opening_balance
    }

    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }
}

/// Trims a catalog name and rejects it when nothing is left.
///
/// Shared by accounts and categories so both collections agree on what
/// "the same name" means.
pub fn normalize_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}

/// Rejects NaN and infinite money values.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(LedgerError::validation(
            field,
            format!("{} is not a finite number", value),
        ));
    }
    Ok(value)
}

// ============================================================================
// TESTS
// ============================================================================

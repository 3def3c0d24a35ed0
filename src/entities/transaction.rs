// 🧾 Transaction Entity - immutable, dated, signed monetary entry
//
// A transaction links exactly one account and one category. Its only side
// effect is the one-time balance delta applied to its account at creation.

use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;
use serde::{Deserialize, Serialize};

use super::account::{ensure_finite, AccountId};
use super::category::{CategoryId, CategoryType};
use crate::error::{LedgerError, Result};

pub type TransactionId = i64;

/// Calendar dates are stored and parsed as ISO text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years whose ISO text is exactly four digits, so the stored text sorts in
/// date order.
pub const STORABLE_YEARS: RangeInclusive<i32> = 1..=9999;

// ============================================================================
// WRITE MODEL
// ============================================================================

/// Request to record a transaction.
///
/// The sign of `amount` is the caller's convention; it is not checked
/// against the category type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub account_id: AccountId,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub amount: f64,
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        account_id: AccountId,
        category_id: CategoryId,
        amount: f64,
    ) -> Self {
        NewTransaction {
            date,
            account_id,
            category_id,
            description: None,
            amount,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the date and amount and folds a blank description into `None`.
    pub(crate) fn validated(mut self) -> Result<Self> {
        if !STORABLE_YEARS.contains(&self.date.year()) {
            return Err(LedgerError::validation(
                "date",
                format!(
                    "{} is outside the years {} to {}",
                    self.date,
                    STORABLE_YEARS.start(),
                    STORABLE_YEARS.end()
                ),
            ));
        }
        self.amount = ensure_finite("amount", self.amount)?;
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

/// Parses an ISO `YYYY-MM-DD` date coming from a presentation layer.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        LedgerError::validation("date", format!("'{}' is not a calendar date ({})", raw, e))
    })
}

// ============================================================================
// READ MODELS
// ============================================================================

/// A transaction joined with its account and category, as listed to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub account_id: AccountId,
    pub account: String,
    pub category_id: CategoryId,
    pub category: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub description: Option<String>,
    pub amount: f64,
}

/// The slice of a transaction the reporting engine aggregates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub category_type: CategoryType,
}

// 🏷️ Category Entity - typed classification of a transaction
//
// Categories are immutable once created. The type set is closed and is
// enforced twice: by the `CategoryType` enum and by a CHECK constraint.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

pub type CategoryId = i64;

// ============================================================================
// CATEGORY TYPE
// ============================================================================

/// Variant order is alphabetical; reports use it to order pivot columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryType {
    /// Expense category (money going out)
    Expense,

    /// Income category (money coming in)
    Income,

    /// Transfer between accounts (neutral)
    Transfer,
}

impl CategoryType {
    pub const ALL: [CategoryType; 3] = [
        CategoryType::Expense,
        CategoryType::Income,
        CategoryType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "Expense",
            CategoryType::Income => "Income",
            CategoryType::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = LedgerError;

    /// Exact, case-sensitive match against the stored spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                LedgerError::InvalidArgument(format!(
                    "category type '{}' is not one of Income, Expense, Transfer",
                    s
                ))
            })
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    /// Unique, trimmed name (e.g., "Rent", "Salary")
    pub name: String,

    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

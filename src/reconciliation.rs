// ⚖️ Reconciliation - verify balances against transaction history
//
// Balances are maintained incrementally, so this check recomputes them:
//   opening_balance + sum(transaction amounts) = balance
//
// A mismatch means the write path skipped, duplicated or reordered a delta.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{self, Database};
use crate::entities::{Account, AccountId};
use crate::error::{Entity, LedgerError, Result};

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationResult {
    /// Recorded balance matches the recomputed one
    Balanced { balance: f64 },

    /// Recorded balance drifted from the history
    Discrepancy {
        expected_balance: f64,
        recorded_balance: f64,
        difference: f64,
    },
}

impl ReconciliationResult {
    pub fn is_balanced(&self) -> bool {
        matches!(self, ReconciliationResult::Balanced { .. })
    }

    pub fn difference(&self) -> f64 {
        match self {
            ReconciliationResult::Balanced { .. } => 0.0,
            ReconciliationResult::Discrepancy { difference, .. } => *difference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub account_id: AccountId,
    pub account: String,
    pub opening_balance: f64,
    pub transactions_total: f64,
    pub result: ReconciliationResult,
}

impl BalanceCheck {
    pub fn is_balanced(&self) -> bool {
        self.result.is_balanced()
    }

    pub fn summary(&self) -> String {
        match &self.result {
            ReconciliationResult::Balanced { balance } => {
                format!("{}: balanced at {:.2}", self.account, balance)
            }
            ReconciliationResult::Discrepancy {
                expected_balance,
                recorded_balance,
                difference,
            } => format!(
                "{}: recorded {:.2}, expected {:.2} (off by {:.2})",
                self.account, recorded_balance, expected_balance, difference
            ),
        }
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Clone)]
pub struct ReconciliationEngine {
    db: Arc<Database>,

    /// Tolerance for floating-point comparisons (default: 0.01)
    pub tolerance: f64,
}

impl ReconciliationEngine {
    pub fn new(db: Arc<Database>) -> Self {
        ReconciliationEngine {
            db,
            tolerance: 0.01,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn check_account(&self, account_id: AccountId) -> Result<BalanceCheck> {
        self.db.read(|conn| {
            let account = db::find_account(conn, account_id)?.ok_or(LedgerError::NotFound {
                entity: Entity::Account,
                id: account_id,
            })?;
            let total = db::sum_account_transactions(conn, account_id)?;
            Ok(self.evaluate(account, total))
        })
    }

    /// Check every account in one consistent read.
    pub fn check_all(&self) -> Result<Vec<BalanceCheck>> {
        self.db.read(|conn| {
            db::select_accounts(conn)?
                .into_iter()
                .map(|account| -> Result<BalanceCheck> {
                    let total = db::sum_account_transactions(conn, account.id)?;
                    Ok(self.evaluate(account, total))
                })
                .collect()
        })
    }

    fn evaluate(&self, account: Account, transactions_total: f64) -> BalanceCheck {
        let expected = account.opening_balance + transactions_total;
        let difference = (expected - account.balance).abs();

        let result = if difference < self.tolerance {
            ReconciliationResult::Balanced {
                balance: account.balance,
            }
        } else {
            ReconciliationResult::Discrepancy {
                expected_balance: expected,
                recorded_balance: account.balance,
                difference,
            }
        };

        BalanceCheck {
            account_id: account.id,
            account: account.name,
            opening_balance: account.opening_balance,
            transactions_total,
            result,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

// 📒 Ledger Engine - invariant-preserving transaction recording
//
// Recording a transaction is two writes: insert the row, then add its amount
// to the account balance. Both run in one store transaction, so either both
// land or neither does, and the balance delta is applied exactly once.

use std::sync::Arc;

use crate::db::{self, Database};
use crate::entities::{NewTransaction, TransactionId, TransactionRow};
use crate::error::{Entity, LedgerError, Result};

#[derive(Clone)]
pub struct Ledger {
    db: Arc<Database>,
}

impl Ledger {
    pub fn new(db: Arc<Database>) -> Self {
        Ledger { db }
    }

    /// Record a transaction and apply its balance delta atomically.
    ///
    /// Fails with `NotFound` for a dangling account or category id and with
    /// `Validation` for a non-finite amount. On any failure neither table
    /// changes.
    pub fn record_transaction(&self, request: NewTransaction) -> Result<TransactionId> {
        let request = request.validated()?;

        self.db.write(|tx| {
            if db::find_account(tx, request.account_id)?.is_none() {
                return Err(LedgerError::NotFound {
                    entity: Entity::Account,
                    id: request.account_id,
                });
            }
            if db::find_category(tx, request.category_id)?.is_none() {
                return Err(LedgerError::NotFound {
                    entity: Entity::Category,
                    id: request.category_id,
                });
            }

            let id = db::insert_transaction(tx, &request)?;
            db::apply_balance_delta(tx, request.account_id, request.amount)?;
            Ok(id)
        })
    }

    /// All transactions, newest date first, ties by most recent insert.
    pub fn list_transactions(&self) -> Result<Vec<TransactionRow>> {
        self.db.read(db::select_transaction_rows)
    }

    pub fn transaction_count(&self) -> Result<i64> {
        self.db.read(db::count_transactions)
    }
}

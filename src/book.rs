// 📚 Book - the operation set presentation layers call into
//
// One store shared by the catalog, ledger, reports and reconciliation.
// Cloning a Book is cheap and every clone sees the same data.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::db::Database;
use crate::entities::{
    Account, AccountId, Category, CategoryId, CategoryType, NewTransaction, TransactionId,
    TransactionRow,
};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::reconciliation::{BalanceCheck, ReconciliationEngine};
use crate::reports::{BalancePoint, CategoryTotal, MonthlyPivot, Reports};

#[derive(Clone)]
pub struct Book {
    catalog: Catalog,
    ledger: Ledger,
    reports: Reports,
    reconciliation: ReconciliationEngine,
}

impl Book {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_database(Arc::new(Database::open(config)?)))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    pub fn with_database(db: Arc<Database>) -> Self {
        Book {
            catalog: Catalog::new(db.clone()),
            ledger: Ledger::new(db.clone()),
            reports: Reports::new(db.clone()),
            reconciliation: ReconciliationEngine::new(db),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // Catalog

    pub fn create_account(&self, name: &str, initial_balance: f64) -> Result<AccountId> {
        self.catalog.create_account(name, initial_balance)
    }

    pub fn create_category(&self, name: &str, kind: CategoryType) -> Result<CategoryId> {
        self.catalog.create_category(name, kind)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.catalog.list_accounts()
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.catalog.list_categories()
    }

    // Ledger

    pub fn record_transaction(&self, request: NewTransaction) -> Result<TransactionId> {
        self.ledger.record_transaction(request)
    }

    pub fn list_transactions(&self) -> Result<Vec<TransactionRow>> {
        self.ledger.list_transactions()
    }

    pub fn transaction_count(&self) -> Result<i64> {
        self.ledger.transaction_count()
    }

    // Reports

    pub fn cumulative_balance(&self) -> Result<Option<Vec<BalancePoint>>> {
        self.reports.cumulative_balance()
    }

    pub fn expenses_by_category(&self) -> Result<Option<Vec<CategoryTotal>>> {
        self.reports.expenses_by_category()
    }

    pub fn monthly_pivot(&self) -> Result<Option<MonthlyPivot>> {
        self.reports.monthly_pivot()
    }

    // Reconciliation

    pub fn check_account(&self, account_id: AccountId) -> Result<BalanceCheck> {
        self.reconciliation.check_account(account_id)
    }

    pub fn check_all(&self) -> Result<Vec<BalanceCheck>> {
        self.reconciliation.check_all()
    }
}

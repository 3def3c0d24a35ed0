// 📇 Entity Catalog - account and category creation with unique names
//
// Names are trimmed before they reach the store, so "Rent" and " Rent "
// collide on the UNIQUE constraint.

use std::sync::Arc;

use crate::db::{self, Database};
use crate::entities::account::{ensure_finite, normalize_name};
use crate::entities::{Account, AccountId, Category, CategoryId, CategoryType};
use crate::error::Result;

#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Arc<Database>) -> Self {
        Catalog { db }
    }

    /// Create an account whose balance starts at `initial_balance`.
    pub fn create_account(&self, name: &str, initial_balance: f64) -> Result<AccountId> {
        let name = normalize_name(name)?;
        let initial_balance = ensure_finite("initial balance", initial_balance)?;

        self.db
            .write(|tx| db::insert_account(tx, &name, initial_balance))
    }

    pub fn create_category(&self, name: &str, kind: CategoryType) -> Result<CategoryId> {
        let name = normalize_name(name)?;

        self.db.write(|tx| db::insert_category(tx, &name, kind))
    }

    /// Accounts ordered by name ascending
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.db.read(db::select_accounts)
    }

    /// Categories ordered by type, then name
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.db.read(db::select_categories)
    }

    pub fn account(&self, id: AccountId) -> Result<Option<Account>> {
        self.db.read(|conn| db::find_account(conn, id))
    }

    pub fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.db.read(|conn| db::find_category(conn, id))
    }

    pub fn account_by_name(&self, name: &str) -> Result<Option<Account>> {
        self.db
            .read(|conn| db::find_account_by_name(conn, name.trim()))
    }

    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.db
            .read(|conn| db::find_category_by_name(conn, name.trim()))
    }
}

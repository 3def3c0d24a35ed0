// 🗄️ Storage Access - SQLite store for accounts, categories and transactions
//
// `Database` owns the single connection. Reads and writes go through
// closures so every caller (catalog, ledger, reports, reconciliation) shares
// the same locking and transaction boundary. The row helpers below take a
// plain `&Connection`, which a write transaction derefs to.

use rusqlite::{ffi, params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::entities::{
    Account, AccountId, Category, CategoryId, CategoryType, HistoryEntry, NewTransaction,
    TransactionId, TransactionRow,
};
use crate::error::{Entity, LedgerError, Result};

// ============================================================================
// DATABASE HANDLE
// ============================================================================

pub struct Database {
    conn: Mutex<Connection>,

    /// Bumped after every committed write; read caches key on it
    generation: AtomicU64,
}

impl Database {
    /// Open (creating if needed) the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };

        if config.busy_timeout_ms > 0 {
            conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        }

        setup_database(&conn, config.wal)?;
        info!(path = %config.path.display(), "ledger store ready");

        Ok(Database {
            conn: Mutex::new(conn),
            generation: AtomicU64::new(0),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run a read against the store. Never observes a half-applied write.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside one IMMEDIATE transaction.
    ///
    /// Commits when `f` returns `Ok`; any error (including one raised by
    /// SQLite halfway through `f`) rolls back every statement `f` executed.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(generation, "write committed");
                Ok(value)
            }
            Err(err) => {
                // Dropping the transaction rolls it back
                drop(tx);
                debug!(error = %err, "write rolled back");
                Err(err)
            }
        }
    }

    /// Number of writes committed through this handle.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Version of the store as seen from this handle. It changes after a
    /// commit through this handle and after a commit by any other
    /// connection to the same file.
    pub fn version(&self, conn: &Connection) -> Result<StoreVersion> {
        Ok(StoreVersion {
            generation: self.generation(),
            data_version: data_version(conn)?,
        })
    }
}

/// Cache key for anything derived from the store's contents.
///
/// `generation` tracks commits made through this handle. SQLite's
/// `data_version` tracks commits made by other connections, which this
/// handle's counter never sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreVersion {
    pub generation: u64,
    pub data_version: i64,
}

fn data_version(conn: &Connection) -> Result<i64> {
    Ok(conn.pragma_query_value(None, "data_version", |row| row.get(0))?)
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection, wal: bool) -> Result<()> {
    if wal {
        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }

    conn.pragma_update(None, "foreign_keys", true)?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            opening_balance REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            type TEXT NOT NULL CHECK(type IN ('Income', 'Expense', 'Transfer'))
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            category_id INTEGER NOT NULL REFERENCES categories(id),
            description TEXT,
            amount REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
        CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);",
    )?;

    migrate_opening_balance(conn)?;

    Ok(())
}

/// Bring a store written by the earlier single-table-balance version up to
/// date: add `opening_balance` and back-fill it from the transaction history
/// so that `balance == opening_balance + sum(amounts)` holds.
///
/// Returns true when the column had to be added.
pub fn migrate_opening_balance(conn: &Connection) -> Result<bool> {
    let columns = {
        let mut stmt = conn.prepare("PRAGMA table_info(accounts)")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        names
    };

    if columns.iter().any(|c| c == "opening_balance") {
        return Ok(false);
    }

    conn.execute_batch(
        "BEGIN;
        ALTER TABLE accounts ADD COLUMN opening_balance REAL NOT NULL DEFAULT 0;
        UPDATE accounts
           SET opening_balance = COALESCE(balance, 0) - COALESCE(
               (SELECT SUM(t.amount) FROM transactions t WHERE t.account_id = accounts.id), 0);
        COMMIT;",
    )?;

    info!("migrated accounts table: added opening_balance");
    Ok(true)
}

// ============================================================================
// ACCOUNTS
// ============================================================================

const ACCOUNT_COLUMNS: &str =
    "id, name, COALESCE(balance, 0), COALESCE(opening_balance, 0)";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        balance: row.get(2)?,
        opening_balance: row.get(3)?,
    })
}

pub fn insert_account(conn: &Connection, name: &str, opening_balance: f64) -> Result<AccountId> {
    conn.execute(
        "INSERT INTO accounts (name, balance, opening_balance) VALUES (?1, ?2, ?2)",
        params![name, opening_balance],
    )
    .map_err(|e| unique_violation(e, Entity::Account, name))?;

    Ok(conn.last_insert_rowid())
}

pub fn find_account(conn: &Connection, id: AccountId) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS);
    Ok(conn.query_row(&sql, [id], account_from_row).optional()?)
}

pub fn find_account_by_name(conn: &Connection, name: &str) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM accounts WHERE name = ?1", ACCOUNT_COLUMNS);
    Ok(conn.query_row(&sql, [name], account_from_row).optional()?)
}

/// All accounts ordered by name (binary collation, so case-sensitive).
pub fn select_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let sql = format!("SELECT {} FROM accounts ORDER BY name, id", ACCOUNT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let accounts = stmt
        .query_map([], account_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(accounts)
}

/// Add `delta` to an account's balance.
pub fn apply_balance_delta(conn: &Connection, account_id: AccountId, delta: f64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE accounts SET balance = COALESCE(balance, 0) + ?1 WHERE id = ?2",
        params![delta, account_id],
    )?;

    if changed == 0 {
        return Err(LedgerError::NotFound {
            entity: Entity::Account,
            id: account_id,
        });
    }
    Ok(())
}

// ============================================================================
// CATEGORIES
// ============================================================================

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: row.get(2)?,
    })
}

pub fn insert_category(conn: &Connection, name: &str, kind: CategoryType) -> Result<CategoryId> {
    conn.execute(
        "INSERT INTO categories (name, type) VALUES (?1, ?2)",
        params![name, kind],
    )
    .map_err(|e| unique_violation(e, Entity::Category, name))?;

    Ok(conn.last_insert_rowid())
}

pub fn find_category(conn: &Connection, id: CategoryId) -> Result<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE id = ?1",
            [id],
            category_from_row,
        )
        .optional()?)
}

pub fn find_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE name = ?1",
            [name],
            category_from_row,
        )
        .optional()?)
}

/// All categories ordered by (type, name).
pub fn select_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, type FROM categories ORDER BY type, name, id")?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

pub fn insert_transaction(conn: &Connection, tx: &NewTransaction) -> Result<TransactionId> {
    conn.execute(
        "INSERT INTO transactions (date, account_id, category_id, description, amount)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            tx.date,
            tx.account_id,
            tx.category_id,
            tx.description,
            tx.amount,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Joined listing, newest first; same-day ties by most recently inserted.
pub fn select_transaction_rows(conn: &Connection) -> Result<Vec<TransactionRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.account_id, a.name, t.category_id, c.name, c.type,
                t.description, t.amount
         FROM transactions t
         JOIN accounts a ON a.id = t.account_id
         JOIN categories c ON c.id = t.category_id
         ORDER BY t.date DESC, t.id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                date: row.get(1)?,
                account_id: row.get(2)?,
                account: row.get(3)?,
                category_id: row.get(4)?,
                category: row.get(5)?,
                category_type: row.get(6)?,
                description: row.get(7)?,
                amount: row.get(8)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Full history for reporting, in insertion order.
pub fn select_history(conn: &Connection) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.amount, c.name, c.type
         FROM transactions t
         JOIN categories c ON c.id = t.category_id
         ORDER BY t.id",
    )?;

    let entries = stmt
        .query_map([], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                date: row.get(1)?,
                amount: row.get(2)?,
                category: row.get(3)?,
                category_type: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

/// Sum of every transaction amount recorded against an account.
pub fn sum_account_transactions(conn: &Connection, account_id: AccountId) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE account_id = ?1",
        [account_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count)
}

fn unique_violation(err: rusqlite::Error, entity: Entity, name: &str) -> LedgerError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            LedgerError::DuplicateName {
                entity,
                name: name.to_string(),
            }
        }
        other => LedgerError::Storage(other),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn, false).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = memory_conn();
        setup_database(&conn, false).unwrap();
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_account_maps_to_duplicate_name() {
        let conn = memory_conn();
        insert_account(&conn, "Checking", 0.0).unwrap();

        let err = insert_account(&conn, "Checking", 10.0).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::DuplicateName { entity: Entity::Account, ref name } if name == "Checking"
        ));

        // Names are case-sensitive
        insert_account(&conn, "checking", 0.0).unwrap();
        assert_eq!(select_accounts(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_category_type_check_constraint() {
        let conn = memory_conn();
        let result = conn.execute(
            "INSERT INTO categories (name, type) VALUES ('Gift', 'Bonus')",
            [],
        );
        assert!(result.is_err(), "CHECK constraint should reject unknown type");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = memory_conn();
        let tx = NewTransaction::new(date(2024, 1, 5), 42, 7, 10.0);
        assert!(insert_transaction(&conn, &tx).is_err());
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn test_apply_balance_delta_missing_account() {
        let conn = memory_conn();
        let err = apply_balance_delta(&conn, 99, 5.0).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: Entity::Account, id: 99 }));
    }

    #[test]
    fn test_listing_orders() {
        let conn = memory_conn();
        insert_account(&conn, "Wallet", 0.0).unwrap();
        insert_account(&conn, "Checking", 0.0).unwrap();
        insert_category(&conn, "Salary", CategoryType::Income).unwrap();
        insert_category(&conn, "Rent", CategoryType::Expense).unwrap();
        insert_category(&conn, "Groceries", CategoryType::Expense).unwrap();

        let names: Vec<String> = select_accounts(&conn)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Checking", "Wallet"]);

        let names: Vec<String> = select_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Groceries", "Rent", "Salary"]);
    }

    #[test]
    fn test_transaction_rows_newest_first() {
        let conn = memory_conn();
        let acc = insert_account(&conn, "Checking", 0.0).unwrap();
        let cat = insert_category(&conn, "Misc", CategoryType::Expense).unwrap();

        let first = insert_transaction(&conn, &NewTransaction::new(date(2024, 1, 5), acc, cat, -1.0)).unwrap();
        let second = insert_transaction(&conn, &NewTransaction::new(date(2024, 1, 5), acc, cat, -2.0)).unwrap();
        let older = insert_transaction(&conn, &NewTransaction::new(date(2023, 12, 31), acc, cat, -3.0)).unwrap();

        let ids: Vec<i64> = select_transaction_rows(&conn)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second, first, older]);

        let rows = select_transaction_rows(&conn).unwrap();
        assert_eq!(rows[0].account, "Checking");
        assert_eq!(rows[0].category, "Misc");
        assert_eq!(rows[0].category_type, CategoryType::Expense);
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let before = db.generation();

        let result: Result<()> = db.write(|tx| {
            insert_account(tx, "Checking", 0.0)?;
            Err(LedgerError::validation("test", "forced failure"))
        });

        assert!(result.is_err());
        assert_eq!(db.generation(), before, "failed write must not bump generation");
        let accounts = db.read(|conn| select_accounts(conn)).unwrap();
        assert!(accounts.is_empty());
    }

    #[test]
    fn test_write_commit_bumps_generation() {
        let db = Database::open_in_memory().unwrap();
        db.write(|tx| insert_account(tx, "Checking", 0.0)).unwrap();
        db.write(|tx| insert_account(tx, "Wallet", 0.0)).unwrap();
        assert_eq!(db.generation(), 2);
    }

    #[test]
    fn test_version_sees_commits_from_other_connections() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path().join("ledger.db"));
        let local = Database::open(&config).unwrap();
        let other = Database::open(&config).unwrap();

        let before = local.read(|conn| local.version(conn)).unwrap();
        assert_eq!(before, local.read(|conn| local.version(conn)).unwrap());

        other.write(|tx| insert_account(tx, "Checking", 0.0)).unwrap();

        let after = local.read(|conn| local.version(conn)).unwrap();
        assert_eq!(after.generation, before.generation);
        assert_ne!(after, before);
    }

    #[test]
    fn test_migrate_legacy_store() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE accounts (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                balance REAL DEFAULT 0
            );
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                type TEXT CHECK(type IN ('Income','Expense','Transfer')) NOT NULL
            );
            CREATE TABLE transactions (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                account_id INTEGER,
                category_id INTEGER,
                description TEXT,
                amount REAL NOT NULL,
                FOREIGN KEY(account_id) REFERENCES accounts(id),
                FOREIGN KEY(category_id) REFERENCES categories(id)
            );
            INSERT INTO accounts (id, name, balance) VALUES (1, 'Checking', 150.0);
            INSERT INTO categories (id, name, type) VALUES (1, 'Salary', 'Income');
            INSERT INTO transactions (date, account_id, category_id, description, amount)
                VALUES ('2024-01-05', 1, 1, NULL, 100.0);",
        )
        .unwrap();

        setup_database(&conn, false).unwrap();

        let account = find_account(&conn, 1).unwrap().unwrap();
        assert_eq!(account.balance, 150.0);
        assert_eq!(account.opening_balance, 50.0);

        // Second run is a no-op
        assert!(!migrate_opening_balance(&conn).unwrap());
    }
}

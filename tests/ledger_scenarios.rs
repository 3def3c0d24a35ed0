// End-to-end scenarios against isolated on-disk stores

use chrono::NaiveDate;
use pocket_ledger::{
    Book, CategoryType, Entity, LedgerError, NewTransaction, StoreConfig,
};
use std::thread;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn temp_book() -> (TempDir, StoreConfig, Book) {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new(dir.path().join("ledger.db"));
    let book = Book::open(&config).unwrap();
    (dir, config, book)
}

#[test]
fn salary_then_rent_scenario() {
    let (_dir, _config, book) = temp_book();

    let checking = book.create_account("Checking", 0.0).unwrap();
    let salary = book.create_category("Salary", CategoryType::Income).unwrap();
    book.record_transaction(NewTransaction::new(date(2024, 1, 5), checking, salary, 1000.0))
        .unwrap();

    let accounts = book.list_accounts().unwrap();
    assert_eq!(accounts[0].balance, 1000.0);

    let series = book.cumulative_balance().unwrap().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!((series[0].date, series[0].cumulative), (date(2024, 1, 5), 1000.0));

    let rent = book.create_category("Rent", CategoryType::Expense).unwrap();
    book.record_transaction(
        NewTransaction::new(date(2024, 1, 10), checking, rent, -300.0).with_description("January"),
    )
    .unwrap();

    assert_eq!(book.list_accounts().unwrap()[0].balance, 700.0);

    let expenses = book.expenses_by_category().unwrap().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category, "Rent");
    assert_eq!(expenses[0].total, 300.0);

    let pivot = book.monthly_pivot().unwrap().unwrap();
    assert_eq!(pivot.rows.len(), 1);
    assert_eq!(pivot.get(date(2024, 1, 1), CategoryType::Income), Some(1000.0));
    assert_eq!(pivot.get(date(2024, 1, 1), CategoryType::Expense), Some(-300.0));

    // Duplicate category leaves the catalog unchanged
    let before = book.list_categories().unwrap();
    let err = book.create_category("Salary", CategoryType::Income).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateName { entity: Entity::Category, .. }));
    assert_eq!(book.list_categories().unwrap(), before);
}

#[test]
fn reports_are_idempotent_between_writes() {
    let (_dir, _config, book) = temp_book();
    let acc = book.create_account("Checking", 0.0).unwrap();
    let food = book.create_category("Food", CategoryType::Expense).unwrap();
    let pay = book.create_category("Pay", CategoryType::Income).unwrap();

    for (day, cat, amount) in [(3, food, -20.0), (1, pay, 500.0), (3, food, -7.5)] {
        book.record_transaction(NewTransaction::new(date(2024, 5, day), acc, cat, amount))
            .unwrap();
    }

    assert_eq!(book.cumulative_balance().unwrap(), book.cumulative_balance().unwrap());
    assert_eq!(book.expenses_by_category().unwrap(), book.expenses_by_category().unwrap());
    assert_eq!(book.monthly_pivot().unwrap(), book.monthly_pivot().unwrap());
}

#[test]
fn data_survives_reopen() {
    let (_dir, config, book) = temp_book();
    let acc = book.create_account("Savings", 100.0).unwrap();
    let cat = book.create_category("Interest", CategoryType::Income).unwrap();
    let id = book
        .record_transaction(NewTransaction::new(date(2024, 6, 30), acc, cat, 1.25))
        .unwrap();
    drop(book);

    let reopened = Book::open(&config).unwrap();
    let rows = reopened.list_transactions().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].account, "Savings");
    assert_eq!(reopened.list_accounts().unwrap()[0].balance, 101.25);
    assert!(reopened.check_account(acc).unwrap().is_balanced());
}

#[test]
fn dangling_reference_changes_nothing() {
    let (_dir, _config, book) = temp_book();
    let acc = book.create_account("Checking", 5.0).unwrap();
    let cat = book.create_category("Misc", CategoryType::Transfer).unwrap();

    let err = book
        .record_transaction(NewTransaction::new(date(2024, 1, 1), acc, cat + 50, 10.0))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: Entity::Category, .. }));

    assert!(book.list_transactions().unwrap().is_empty());
    assert_eq!(book.list_accounts().unwrap()[0].balance, 5.0);
    assert!(book.cumulative_balance().unwrap().is_none());
}

#[test]
fn concurrent_writers_keep_balances_consistent() {
    let (_dir, _config, book) = temp_book();
    let a = book.create_account("A", 0.0).unwrap();
    let b = book.create_account("B", 10.0).unwrap();
    let cat = book.create_category("Misc", CategoryType::Transfer).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let book = book.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let account = if (worker + i) % 2 == 0 { a } else { b };
                    book.record_transaction(NewTransaction::new(date(2024, 1, 1), account, cat, 1.5))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(book.list_transactions().unwrap().len(), 100);
    let checks = book.check_all().unwrap();
    assert!(checks.iter().all(|c| c.is_balanced()));

    let total: f64 = book.list_accounts().unwrap().iter().map(|acc| acc.balance).sum();
    assert_eq!(total, 10.0 + 100.0 * 1.5);
}

#[test]
fn reports_follow_writes_from_another_handle() {
    let (_dir, config, cli) = temp_book();
    let server = Book::open(&config).unwrap();

    let acc = cli.create_account("Checking", 0.0).unwrap();
    let pay = cli.create_category("Pay", CategoryType::Income).unwrap();
    cli.record_transaction(NewTransaction::new(date(2024, 1, 5), acc, pay, 1000.0))
        .unwrap();

    assert_eq!(server.cumulative_balance().unwrap().unwrap().len(), 1);

    cli.record_transaction(NewTransaction::new(date(2024, 1, 10), acc, pay, 5.0))
        .unwrap();

    assert_eq!(server.list_transactions().unwrap().len(), 2);
    let series = server.cumulative_balance().unwrap().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[1].cumulative, 1005.0);
    let pivot = server.monthly_pivot().unwrap().unwrap();
    assert_eq!(pivot.get(date(2024, 1, 1), CategoryType::Income), Some(1005.0));
}

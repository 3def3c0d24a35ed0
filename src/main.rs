use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::env;

use pocket_ledger::{parse_date, Book, CategoryType, NewTransaction, StoreConfig};

const USAGE: &str = "Usage:
  pocket-ledger account add <name> [initial-balance]
  pocket-ledger account list
  pocket-ledger category add <name> <Income|Expense|Transfer>
  pocket-ledger category list
  pocket-ledger tx add <YYYY-MM-DD> <account> <category> <amount> [description...]
  pocket-ledger tx list
  pocket-ledger report <balance|expenses|monthly>
  pocket-ledger check

The store file is read from POCKET_LEDGER_DB (default: ledger.db).";

fn main() -> Result<()> {
    pocket_ledger::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let words: Vec<&str> = args.iter().map(String::as_str).collect();

    if words.is_empty() || matches!(words[0], "help" | "-h" | "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = StoreConfig::from_env();
    let book = Book::open(&config)
        .with_context(|| format!("Failed to open ledger at {}", config.path.display()))?;

    match words.as_slice() {
        ["account", "add", name, rest @ ..] => add_account(&book, name, rest),
        ["account", "list"] => list_accounts(&book),
        ["category", "add", name, kind] => add_category(&book, name, kind),
        ["category", "list"] => list_categories(&book),
        ["tx", "add", date, account, category, amount, description @ ..] => {
            add_transaction(&book, date, account, category, amount, description)
        }
        ["tx", "list"] => list_transactions(&book),
        ["report", kind] => report(&book, kind),
        ["check"] => check(&book),
        _ => bail!("Unrecognised command: {}\n\n{}", words.join(" "), USAGE),
    }
}

fn parse_amount(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .with_context(|| format!("'{}' is not a number", raw))
}

fn add_account(book: &Book, name: &str, rest: &[&str]) -> Result<()> {
    let initial = match rest {
        [] => 0.0,
        [balance] => parse_amount(balance)?,
        _ => bail!("account add takes a name and an optional initial balance"),
    };

    let id = book.create_account(name, initial)?;
    println!("✓ Account #{} '{}' created with balance {:.2}", id, name.trim(), initial);
    Ok(())
}

fn list_accounts(book: &Book) -> Result<()> {
    let accounts = book.list_accounts()?;
    if accounts.is_empty() {
        println!("No accounts yet.");
        return Ok(());
    }

    println!("{:>4}  {:<24} {:>12} {:>12}", "ID", "NAME", "BALANCE", "CHANGE");
    for account in accounts {
        let flag = if account.is_overdrawn() { "  ⚠️ overdrawn" } else { "" };
        println!(
            "{:>4}  {:<24} {:>12.2} {:>+12.2}{}",
            account.id,
            account.name,
            account.balance,
            account.balance_change(),
            flag
        );
    }
    Ok(())
}

fn add_category(book: &Book, name: &str, kind: &str) -> Result<()> {
    let kind: CategoryType = kind.parse()?;
    let id = book.create_category(name, kind)?;
    println!("✓ Category #{} '{}' ({}) created", id, name.trim(), kind);
    Ok(())
}

fn list_categories(book: &Book) -> Result<()> {
    let categories = book.list_categories()?;
    if categories.is_empty() {
        println!("No categories yet.");
        return Ok(());
    }

    println!("{:>4}  {:<24} {:<10}", "ID", "NAME", "TYPE");
    for category in categories {
        println!("{:>4}  {:<24} {:<10}", category.id, category.name, category.category_type);
    }
    Ok(())
}

fn add_transaction(
    book: &Book,
    date: &str,
    account: &str,
    category: &str,
    amount: &str,
    description: &[&str],
) -> Result<()> {
    let date = parse_date(date)?;
    let amount = parse_amount(amount)?;

    // The CLI selects by name; the ledger works with ids
    let account = book
        .catalog()
        .account_by_name(account)?
        .ok_or_else(|| anyhow!("No account named '{}'", account))?;
    let category = book
        .catalog()
        .category_by_name(category)?
        .ok_or_else(|| anyhow!("No category named '{}'", category))?;

    let mut request = NewTransaction::new(date, account.id, category.id, amount);
    if !description.is_empty() {
        request = request.with_description(description.join(" "));
    }

    let id = book.record_transaction(request)?;
    println!(
        "✓ Transaction #{} recorded: {} {:.2} on {} ({})",
        id, date, amount, account.name, category.name
    );
    Ok(())
}

fn list_transactions(book: &Book) -> Result<()> {
    let rows = book.list_transactions()?;
    if rows.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<16} {:<16} {:<8} {:>12}  {}",
        "ID", "DATE", "ACCOUNT", "CATEGORY", "TYPE", "AMOUNT", "DESCRIPTION"
    );
    for row in rows {
        println!(
            "{:>5}  {:<10}  {:<16} {:<16} {:<8} {:>12.2}  {}",
            row.id,
            row.date,
            row.account,
            row.category,
            row.category_type,
            row.amount,
            row.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn print_report<T: Serialize>(report: Option<T>) -> Result<()> {
    match report {
        Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
        None => println!("Not enough data to build reports yet."),
    }
    Ok(())
}

fn report(book: &Book, kind: &str) -> Result<()> {
    match kind {
        "balance" => print_report(book.cumulative_balance()?),
        "expenses" => print_report(book.expenses_by_category()?),
        "monthly" => print_report(book.monthly_pivot()?),
        other => bail!("Unknown report '{}': use balance, expenses or monthly", other),
    }
}

fn check(book: &Book) -> Result<()> {
    let checks = book.check_all()?;
    let mut unbalanced = 0;

    for check in &checks {
        let mark = if check.is_balanced() { "✓" } else { "✗" };
        println!("{} {}", mark, check.summary());
        if !check.is_balanced() {
            unbalanced += 1;
        }
    }

    if unbalanced > 0 {
        bail!("{} of {} accounts do not reconcile", unbalanced, checks.len());
    }
    println!(
        "✅ All {} accounts reconcile across {} transactions",
        checks.len(),
        book.transaction_count()?
    );
    Ok(())
}

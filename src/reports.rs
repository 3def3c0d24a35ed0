// 📊 Reporting Engine - read-only aggregation over the full history
//
// The three views are pure functions over a history snapshot. `Reports`
// loads that snapshot from the store and keeps it until the store version
// moves, so repeated report calls between writes hit the cache. The version
// also moves when another handle or process commits to the same file.
//
// Every view returns `None` when there are no transactions at all.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::db::{self, Database, StoreVersion};
use crate::entities::{CategoryType, HistoryEntry};
use crate::error::{LedgerError, Result};

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Absolute value of the category's summed amounts
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// First day of the month
    pub month: NaiveDate,
    /// One entry per pivot column; signed sums, zero when absent
    pub totals: BTreeMap<CategoryType, f64>,
}

/// Month × category type table of signed sums.
///
/// Signs are kept as recorded: an expense month shows a negative Expense
/// total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPivot {
    /// Category types present in the data, ordered Expense, Income, Transfer
    pub columns: Vec<CategoryType>,
    /// Months ascending
    pub rows: Vec<MonthlyTotals>,
}

impl MonthlyPivot {
    pub fn get(&self, month: NaiveDate, kind: CategoryType) -> Option<f64> {
        let month = first_of_month(month);
        self.rows
            .iter()
            .find(|row| row.month == month)
            .and_then(|row| row.totals.get(&kind).copied())
    }
}

// ============================================================================
// PURE VIEWS
// ============================================================================

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Running sum of every amount, one point per transaction.
///
/// Spans all accounts, so it tracks the overall trend rather than any single
/// account's balance. Same-day transactions keep insertion (id) order.
pub fn cumulative_balance(history: &[HistoryEntry]) -> Option<Vec<BalancePoint>> {
    if history.is_empty() {
        return None;
    }

    let mut ordered: Vec<&HistoryEntry> = history.iter().collect();
    ordered.sort_by_key(|entry| (entry.date, entry.id));

    let mut running = 0.0;
    let series = ordered
        .into_iter()
        .map(|entry| {
            running += entry.amount;
            BalancePoint {
                date: entry.date,
                cumulative: running,
            }
        })
        .collect();

    Some(series)
}

/// Expense totals per category name, largest magnitude first.
///
/// `Some(vec![])` means there is history but none of it is an expense.
pub fn expenses_by_category(history: &[HistoryEntry]) -> Option<Vec<CategoryTotal>> {
    if history.is_empty() {
        return None;
    }

    let mut sums: HashMap<&str, f64> = HashMap::new();
    for entry in history
        .iter()
        .filter(|e| e.category_type == CategoryType::Expense)
    {
        *sums.entry(entry.category.as_str()).or_insert(0.0) += entry.amount;
    }

    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category: category.to_string(),
            total: sum.abs(),
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    Some(totals)
}

/// Signed sums grouped by (month, category type).
pub fn monthly_pivot(history: &[HistoryEntry]) -> Option<MonthlyPivot> {
    if history.is_empty() {
        return None;
    }

    let columns: BTreeSet<CategoryType> = history.iter().map(|e| e.category_type).collect();

    let mut months: BTreeMap<NaiveDate, BTreeMap<CategoryType, f64>> = BTreeMap::new();
    for entry in history {
        let totals = months.entry(first_of_month(entry.date)).or_insert_with(|| {
            columns.iter().map(|kind| (*kind, 0.0)).collect()
        });
        *totals.entry(entry.category_type).or_insert(0.0) += entry.amount;
    }

    Some(MonthlyPivot {
        columns: columns.into_iter().collect(),
        rows: months
            .into_iter()
            .map(|(month, totals)| MonthlyTotals { month, totals })
            .collect(),
    })
}

// ============================================================================
// REPORTING SERVICE
// ============================================================================

struct Snapshot {
    version: StoreVersion,
    history: Arc<Vec<HistoryEntry>>,
}

#[derive(Clone)]
pub struct Reports {
    db: Arc<Database>,
    cache: Arc<RwLock<Option<Snapshot>>>,
}

impl Reports {
    pub fn new(db: Arc<Database>) -> Self {
        Reports {
            db,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Current history, reloaded only when a write has committed since the
    /// last load, through this handle or any other connection.
    pub fn history(&self) -> Result<Arc<Vec<HistoryEntry>>> {
        // The version check and the reload share one read, so no local write
        // can land between them.
        self.db.read(|conn| {
            let version = self.db.version(conn)?;

            {
                let cache = self.cache.read().map_err(|_| LedgerError::LockPoisoned)?;
                if let Some(snapshot) = cache.as_ref() {
                    if snapshot.version == version {
                        return Ok(snapshot.history.clone());
                    }
                }
            }

            let history = Arc::new(db::select_history(conn)?);
            debug!(
                generation = version.generation,
                data_version = version.data_version,
                entries = history.len(),
                "report snapshot reloaded"
            );

            let mut cache = self.cache.write().map_err(|_| LedgerError::LockPoisoned)?;
            *cache = Some(Snapshot {
                version,
                history: history.clone(),
            });

            Ok(history)
        })
    }

    pub fn cumulative_balance(&self) -> Result<Option<Vec<BalancePoint>>> {
        Ok(cumulative_balance(&self.history()?))
    }

    pub fn expenses_by_category(&self) -> Result<Option<Vec<CategoryTotal>>> {
        Ok(expenses_by_category(&self.history()?))
    }

    pub fn monthly_pivot(&self) -> Result<Option<MonthlyPivot>> {
        Ok(monthly_pivot(&self.history()?))
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Pocket Ledger - Core Library
// Exposes the ledger engine for the CLI, the API server, and tests

pub mod book;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod reconciliation;
pub mod reports;

#[cfg(feature = "server")]
pub mod api;

use std::sync::Once;

// Re-export commonly used types
pub use book::Book;
pub use catalog::Catalog;
pub use config::StoreConfig;
pub use db::Database;
pub use entities::{
    parse_date, Account, AccountId, Category, CategoryId, CategoryType, HistoryEntry,
    NewTransaction, TransactionId, TransactionRow,
};
pub use error::{Entity, LedgerError, Result};
pub use ledger::Ledger;
pub use reconciliation::{BalanceCheck, ReconciliationEngine, ReconciliationResult};
pub use reports::{BalancePoint, CategoryTotal, MonthlyPivot, MonthlyTotals, Reports};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static INIT_TRACING: Once = Once::new();

/// Installs the global fmt subscriber for the binaries.
///
/// `RUST_LOG` overrides the default `pocket_ledger=info` directive.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pocket_ledger=info"));

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_twice_does_not_panic() {
        super::init_tracing();
        super::init_tracing();
    }
}

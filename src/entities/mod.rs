// Entity Models
//
// Accounts and categories form the catalog; transactions reference one of
// each by id. Ids are assigned by the store.

pub mod account;
pub mod category;
pub mod transaction;

pub use account::{Account, AccountId};
pub use category::{Category, CategoryId, CategoryType};
pub use transaction::{
    parse_date, HistoryEntry, NewTransaction, TransactionId, TransactionRow, DATE_FORMAT,
};

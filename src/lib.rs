// Expense Analyzer - Core Library
// Exposes the ledger core for the CLI, the TUI, the API server, and tests

pub mod error;
pub mod ledger;
pub mod categories;
pub mod persistence;
pub mod summary;
pub mod book;
pub mod config;
pub mod files;
pub mod logging;

// Re-export commonly used types
pub use error::LedgerError;
pub use ledger::{parse_amount, ExpenseRecord, Ledger};
pub use categories::{categories, category_counts, default_selection, sorted_categories};
pub use persistence::{parse, serialize, RawRecord};
pub use summary::{summarize, DistributionSummary};
pub use book::{ExpenseBook, SharedBook};
pub use config::AppConfig;

// Transaction Importer - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod db;
pub mod entities;
pub mod error;
pub mod importer;
pub mod logging;
pub mod parser;
pub mod reconciliation;

// Re-export commonly used types
pub use db::{
    count_categories, count_transactions, find_categories_by_titles, get_balance,
    insert_categories, insert_transactions, list_categories, list_transactions,
    setup_database,
};
pub use entities::{Balance, Category, NewTransaction, Transaction, TransactionRecord, TransactionType};
pub use error::{ImportError, Result};
pub use importer::{ImportOutcome, Importer};
pub use parser::{parse_csv, parse_value, ParsedFile, RawTransaction};
pub use reconciliation::{CategoryResolver, ReconciliationPlan};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

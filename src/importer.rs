// 📥 Importer - CSV file → categories + transactions
//
// Steps:
//   1. parse the whole file (rows missing title/type/value are dropped)
//   2. batch-lookup the referenced categories
//   3. insert the missing categories
//   4. insert one transaction per kept row
//   5. delete the source file
//
// Steps 2-4 share one SQLite transaction. Two imports running at the same
// time that both introduce the same new title can still collide on the
// unique title constraint; the losing import fails and rolls back.

use crate::db;
use crate::entities::{Category, NewTransaction, Transaction};
use crate::error::{ImportError, Result};
use crate::parser::{self, RawTransaction};
use crate::reconciliation::{self, CategoryResolver, ReconciliationPlan};
use rusqlite::Connection;
use std::path::Path;

// ============================================================================
// IMPORT OUTCOME
// ============================================================================

/// Result of a committed import
#[derive(Debug)]
pub struct ImportOutcome {
    /// Created transactions, in file order
    pub transactions: Vec<Transaction>,

    /// Categories created by this import
    pub categories_created: Vec<Category>,

    /// Data rows dropped for a missing title, type or value
    pub skipped_rows: usize,

    /// Set when the source file could not be deleted after commit
    pub cleanup_error: Option<ImportError>,
}

impl ImportOutcome {
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }
}

// ============================================================================
// IMPORTER
// ============================================================================

pub struct Importer<'c> {
    conn: &'c mut Connection,
}

impl<'c> Importer<'c> {
    /// The connection must already have the schema (`db::setup_database`)
    pub fn new(conn: &'c mut Connection) -> Self {
        Importer { conn }
    }

    /// Import the CSV file at `path`, then delete it
    pub fn execute(&mut self, path: &Path) -> Result<ImportOutcome> {
        tracing::info!(path = %path.display(), "importing transactions");

        let parsed = parser::parse_csv(path)?;
        tracing::debug!(
            rows = parsed.rows.len(),
            skipped = parsed.skipped,
            "parsed import file"
        );

        let tx = self.conn.transaction()?;

        let lookup = reconciliation::distinct_titles(&parsed.category_titles);
        let existing = db::find_categories_by_titles(&tx, &lookup)?;
        let plan = ReconciliationPlan::new(&parsed.category_titles, existing);
        tracing::debug!(
            existing = plan.existing.len(),
            new = plan.new_titles.len(),
            "reconciled categories"
        );

        let created = if plan.is_noop() {
            Vec::new()
        } else {
            db::insert_categories(&tx, &plan.new_titles)?
        };
        let resolver = CategoryResolver::new(plan.existing.iter().chain(created.iter()));

        let drafts = parsed
            .rows
            .iter()
            .map(|row| build_draft(row, &resolver))
            .collect();
        let transactions = db::insert_transactions(&tx, drafts)?;

        tx.commit()?;

        tracing::info!(
            transactions = transactions.len(),
            categories_created = created.len(),
            skipped = parsed.skipped,
            "import committed"
        );

        Ok(ImportOutcome {
            transactions,
            categories_created: created,
            skipped_rows: parsed.skipped,
            cleanup_error: remove_source(path),
        })
    }
}

/// Map a parsed row to a transaction draft
///
/// Title and type are copied verbatim; a non-numeric value becomes NaN.
fn build_draft(row: &RawTransaction, resolver: &CategoryResolver) -> NewTransaction {
    NewTransaction {
        title: row.title.clone(),
        transaction_type: row.transaction_type.as_str().into(),
        value: row.amount(),
        category_id: resolver.resolve(&row.category).map(str::to_string),
    }
}

/// Delete the imported file; failures are reported, not raised
fn remove_source(path: &Path) -> Option<ImportError> {
    match std::fs::remove_file(path) {
        Ok(()) => None,
        Err(source) => {
            tracing::warn!(path = %path.display(), error = %source, "could not remove imported file");
            Some(ImportError::Cleanup {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

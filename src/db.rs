// 🗄️ Storage - SQLite persistence for categories and transactions
//
// Every function takes a plain `&Connection`, so the importer can run them
// inside a `rusqlite::Transaction` (which derefs to `Connection`).

use crate::entities::{Balance, Category, NewTransaction, Transaction, TransactionRecord};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Categories Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions Table
    // value is NULL when the imported value was not numeric
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            value REAL,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a category from `row`, starting at column `offset`
fn category_from_row(row: &Row, offset: usize) -> rusqlite::Result<Category> {
    let created_at: String = row.get(offset + 2)?;
    let updated_at: String = row.get(offset + 3)?;

    Ok(Category {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        created_at: parse_timestamp(offset + 2, &created_at)?,
        updated_at: parse_timestamp(offset + 3, &updated_at)?,
    })
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let transaction_type: String = row.get(2)?;
    let value: Option<f64> = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        transaction_type: transaction_type.into(),
        value: value.unwrap_or(f64::NAN),
        category_id: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

// ============================================================================
// CATEGORIES
// ============================================================================

/// Titles bound per lookup query, well under SQLite's host-parameter limit
pub const LOOKUP_CHUNK: usize = 500;

/// Batch lookup of categories by exact title
///
/// One `IN (...)` query per `LOOKUP_CHUNK` titles, so a typical file needs a
/// single query. Duplicate titles in `titles` are harmless.
pub fn find_categories_by_titles(conn: &Connection, titles: &[String]) -> Result<Vec<Category>> {
    let mut categories = Vec::new();

    for chunk in titles.chunks(LOOKUP_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT id, title, created_at, updated_at
             FROM categories
             WHERE title IN ({})
             ORDER BY rowid",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(chunk.iter()), |row| category_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        categories.extend(found);
    }

    Ok(categories)
}

/// Bulk insert one category per title, returning the persisted records
///
/// Fails with a constraint violation if a title already exists.
pub fn insert_categories(conn: &Connection, titles: &[String]) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO categories (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
    )?;

    let mut inserted = Vec::with_capacity(titles.len());

    for title in titles {
        let category = Category::new(title.as_str());

        stmt.execute(params![
            category.id,
            category.title,
            category.created_at.to_rfc3339(),
            category.updated_at.to_rfc3339(),
        ])?;

        inserted.push(category);
    }

    Ok(inserted)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, created_at, updated_at
         FROM categories
         ORDER BY title",
    )?;

    let categories = stmt
        .query_map([], |row| category_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn count_categories(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Bulk insert transaction drafts, assigning identifiers
///
/// The returned records keep the order of `drafts`.
pub fn insert_transactions(conn: &Connection, drafts: Vec<NewTransaction>) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (
            id, title, type, value, category_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    let now = Utc::now();
    let mut inserted = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let tx = draft.into_transaction(uuid::Uuid::new_v4().to_string(), now);
        let value = if tx.value.is_nan() { None } else { Some(tx.value) };

        stmt.execute(params![
            tx.id,
            tx.title,
            tx.transaction_type.as_str(),
            value,
            tx.category_id,
            tx.created_at.to_rfc3339(),
            tx.updated_at.to_rfc3339(),
        ])?;

        inserted.push(tx);
    }

    Ok(inserted)
}

/// All transactions with their category, in insertion order
pub fn list_transactions(conn: &Connection) -> Result<Vec<TransactionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.type, t.value, t.category_id, t.created_at, t.updated_at,
                c.id, c.title, c.created_at, c.updated_at
         FROM transactions t
         LEFT JOIN categories c ON c.id = t.category_id
         ORDER BY t.rowid",
    )?;

    let records = stmt
        .query_map([], |row| {
            let transaction = transaction_from_row(row)?;
            let category_id: Option<String> = row.get(7)?;
            let category = match category_id {
                Some(_) => Some(category_from_row(row, 7)?),
                None => None,
            };

            Ok(TransactionRecord {
                transaction,
                category,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}

/// Income and outcome totals; non-numeric values and other types are ignored
pub fn get_balance(conn: &Connection) -> Result<Balance> {
    let (income, outcome): (f64, f64) = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN value END), 0.0),
            COALESCE(SUM(CASE WHEN type = 'outcome' THEN value END), 0.0)
         FROM transactions",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(Balance::new(income, outcome))
}

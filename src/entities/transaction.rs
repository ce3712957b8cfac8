// 💸 Transaction Entity - income/outcome records created by imports

use super::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TRANSACTION TYPE
// ============================================================================

/// Direction of a transaction
///
/// Imports copy the type column verbatim, so text that is neither `income`
/// nor `outcome` is kept as `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Money coming in
    Income,

    /// Money going out
    Outcome,

    /// Unrecognised type text, preserved as written
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
            TransactionType::Other(raw) => raw,
        }
    }
}

impl From<&str> for TransactionType {
    fn from(raw: &str) -> Self {
        match raw {
            "income" => TransactionType::Income,
            "outcome" => TransactionType::Outcome,
            other => TransactionType::Other(other.to_string()),
        }
    }
}

impl From<String> for TransactionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "income" => TransactionType::Income,
            "outcome" => TransactionType::Outcome,
            _ => TransactionType::Other(raw),
        }
    }
}

impl From<TransactionType> for String {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// TRANSACTION ENTITY
// ============================================================================

/// Persisted transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Identity assigned by the store
    pub id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Amount; NaN when the source value was not numeric
    pub value: f64,

    /// Category reference, `None` when the row had no (matching) category
    pub category_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction draft, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub title: String,
    pub transaction_type: TransactionType,
    pub value: f64,
    pub category_id: Option<String>,
}

impl NewTransaction {
    /// Give the draft its identity and timestamps
    pub fn into_transaction(self, id: String, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            title: self.title,
            transaction_type: self.transaction_type,
            value: self.value,
            category_id: self.category_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Transaction joined with its category, for listings
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Option<Category>,
}

// ============================================================================
// BALANCE
// ============================================================================

/// Income/outcome totals over all stored transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub income: f64,
    pub outcome: f64,
    pub total: f64,
}

impl Balance {
    pub fn new(income: f64, outcome: f64) -> Self {
        Balance {
            income,
            outcome,
            total: income - outcome,
        }
    }
}

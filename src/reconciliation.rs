// ⚖️ Category Reconciliation - map imported titles to category records
//
// Titles collected from the file are split into those already in the store
// and those that must be created. Matching is exact string equality. Empty
// titles never become categories; rows carrying one stay uncategorised.

use crate::entities::Category;
use std::collections::{HashMap, HashSet};

/// Distinct non-empty titles, in first-occurrence order
pub fn distinct_titles(titles: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();

    titles
        .iter()
        .filter(|title| !title.is_empty())
        .filter(|title| seen.insert(*title))
        .cloned()
        .collect()
}

// ============================================================================
// RECONCILIATION PLAN
// ============================================================================

/// Which collected titles already exist and which must be created
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPlan {
    /// Categories found in the store
    pub existing: Vec<Category>,

    /// Titles with no stored category, deduplicated, first-occurrence order
    pub new_titles: Vec<String>,
}

impl ReconciliationPlan {
    pub fn new(collected: &[String], existing: Vec<Category>) -> Self {
        let known: HashSet<&str> = existing.iter().map(|c| c.title.as_str()).collect();

        let new_titles = distinct_titles(collected)
            .into_iter()
            .filter(|title| !known.contains(title.as_str()))
            .collect();

        ReconciliationPlan {
            existing,
            new_titles,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.new_titles.is_empty()
    }
}

// ============================================================================
// CATEGORY RESOLVER
// ============================================================================

/// Title → category id lookup over existing and newly created categories
#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    ids_by_title: HashMap<String, String>,
}

impl CategoryResolver {
    /// Build from categories; the first category seen for a title wins
    pub fn new<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Self {
        let mut ids_by_title = HashMap::new();

        for category in categories {
            ids_by_title
                .entry(category.title.clone())
                .or_insert_with(|| category.id.clone());
        }

        CategoryResolver { ids_by_title }
    }

    /// Category id for `title`, `None` for empty or unknown titles
    pub fn resolve(&self, title: &str) -> Option<&str> {
        if title.is_empty() {
            return None;
        }

        self.ids_by_title.get(title).map(String::as_str)
    }
}

// 🏷️ Category Entity - lazily created lookup records
//
// A category is identified by a UUID and named by a title. Titles are unique
// in the store; imports reuse an existing category instead of creating a
// second one with the same title.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

/// Persisted category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identity (UUID)
    pub id: String,

    /// Category title (e.g., "food", "salary"), unique in the store
    pub title: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a category record with a fresh UUID, ready to be inserted
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();

        Category {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_creation() {
        let category = Category::new("food");

        assert_eq!(category.title, "food");
        assert!(!category.id.is_empty());
        assert_eq!(category.created_at, category.updated_at);
    }

    #[test]
    fn test_category_ids_are_unique() {
        let a = Category::new("food");
        let b = Category::new("food");

        assert_ne!(a.id, b.id);
    }
}

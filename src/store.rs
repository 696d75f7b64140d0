//! Storage seam for purchase records.
//!
//! The receiver only needs one operation: create a purchase. Implement
//! [`PurchaseStore`] to persist to your database; an in-memory
//! implementation is provided for tests and local development.

use async_trait::async_trait;

use crate::error::Result;

/// A recorded course purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Generated record ID.
    pub id: String,
    /// Course identifier from the checkout metadata.
    pub course_id: String,
    /// User identifier from the checkout metadata.
    pub user_id: String,
}

/// Trait for persisting purchase records.
///
/// Plain create semantics: no upsert and no uniqueness guarantee. Replaying
/// the same completion event produces a second row unless the backing store
/// enforces uniqueness itself.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Create one purchase record.
    async fn create_purchase(&self, course_id: &str, user_id: &str) -> Result<Purchase>;
}

/// In-memory purchase store.
///
/// Wraps data in `Arc` for cheap cloning, so a test can keep a handle to
/// inspect what the receiver wrote.
#[derive(Default, Clone)]
pub struct InMemoryPurchaseStore {
    inner: std::sync::Arc<std::sync::RwLock<Vec<Purchase>>>,
}

impl InMemoryPurchaseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded purchases.
    pub fn purchases(&self) -> Vec<Purchase> {
        self.inner.read().unwrap().clone()
    }
}

#[async_trait]
impl PurchaseStore for InMemoryPurchaseStore {
    async fn create_purchase(&self, course_id: &str, user_id: &str) -> Result<Purchase> {
        let purchase = Purchase {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.inner.write().unwrap().push(purchase.clone());
        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_purchase_with_generated_id() {
        let store = InMemoryPurchaseStore::new();
        let purchase = store.create_purchase("c1", "u1").await.unwrap();

        assert_eq!(purchase.course_id, "c1");
        assert_eq!(purchase.user_id, "u1");
        assert!(!purchase.id.is_empty());
        assert_eq!(store.purchases(), vec![purchase]);
    }

    #[tokio::test]
    async fn duplicate_creates_yield_two_rows() {
        let store = InMemoryPurchaseStore::new();
        store.create_purchase("c1", "u1").await.unwrap();
        store.create_purchase("c1", "u1").await.unwrap();

        assert_eq!(store.purchases().len(), 2);
    }
}

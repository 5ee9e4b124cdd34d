//! Document store.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Thread-safe id → document map.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    inner: Arc<DashMap<String, Product>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning it with its id set.
    pub fn save(&self, mut product: Product) -> Product {
        let id = match product.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        product.id = Some(id.clone());
        self.inner.insert(id, product.clone());
        product
    }

    pub fn find_by_id(&self, id: &str) -> Option<Product> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_assigns_id() {
        let store = DocumentStore::new();
        let saved = store.save(Product {
            id: None,
            name: "keyboard".into(),
        });

        let id = saved.id.clone().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.find_by_id(&id), Some(saved));
    }

    #[test]
    fn test_save_keeps_id_and_overwrites() {
        let store = DocumentStore::new();
        store.save(Product {
            id: Some("p1".into()),
            name: "mouse".into(),
        });
        store.save(Product {
            id: Some("p1".into()),
            name: "trackball".into(),
        });

        assert_eq!(store.count(), 1);
        assert_eq!(store.find_by_id("p1").unwrap().name, "trackball");
        assert!(store.find_by_id("p2").is_none());
    }
}

//! Durable key-value storage for the selection, backed by SQLite
//!
//! The selection is stored under a single fixed key as a JSON array of full
//! product records, so a reload restores exactly what was selected even when
//! the catalog has changed since.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::catalog::Product;

/// Key the selection is stored under
pub const SELECTION_KEY: &str = "selectedProducts";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct SelectionStore {
    pool: SqlitePool,
}

impl SelectionStore {
    /// Open (or create) the store at the given SQLite database path
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub async fn new_in_memory_async() -> Result<Self, StoreError> {
        // A single connection that never idles out, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raw value stored under `key`
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Store `value` under `key`, replacing any previous value
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Restore the persisted selection.
    ///
    /// Anything that is not a readable JSON array of products, including a
    /// missing key or a database failure, yields an empty selection. Repeated
    /// ids keep only their first record.
    pub async fn load_selection(&self) -> Vec<Arc<Product>> {
        let raw = match self.get(SELECTION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read saved selection: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Product>>(&raw) {
            Ok(products) => dedup_by_id(products),
            Err(e) => {
                tracing::warn!("Discarding unreadable saved selection: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the selection in order
    pub async fn save_selection(&self, products: &[Arc<Product>]) -> Result<(), StoreError> {
        let records: Vec<&Product> = products.iter().map(|p| p.as_ref()).collect();
        let value = serde_json::to_string(&records)?;
        self.set(SELECTION_KEY, &value).await
    }
}

fn dedup_by_id(products: Vec<Product>) -> Vec<Arc<Product>> {
    let mut selection: Vec<Arc<Product>> = Vec::with_capacity(products.len());
    for product in products {
        if selection.iter().any(|p| p.id == product.id) {
            tracing::debug!(id = %product.id, "Dropping repeated saved selection entry");
            continue;
        }
        selection.push(Arc::new(product));
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductId;

    fn product(id: i64, name: &str) -> Arc<Product> {
        Arc::new(Product {
            id: ProductId::Number(id),
            name: name.into(),
            brand: "Brand".into(),
            category: "skincare".into(),
            image: format!("{}.jpg", id),
            description: "Soothing. Light.".into(),
        })
    }

    #[tokio::test]
    async fn test_missing_key_loads_empty() {
        let store = SelectionStore::new_in_memory_async().await.unwrap();
        assert!(store.load_selection().await.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("picker.db");
        let saved = vec![product(3, "Toner"), product(1, "Cleanser"), product(2, "Serum")];

        {
            let store = SelectionStore::new(&db).await.unwrap();
            store.save_selection(&saved).await.unwrap();
        }

        let reopened = SelectionStore::new(&db).await.unwrap();
        let loaded = reopened.load_selection().await;

        assert_eq!(loaded.len(), 3);
        for (a, b) in loaded.iter().zip(saved.iter()) {
            assert_eq!(a.as_ref(), b.as_ref());
        }
    }

    #[tokio::test]
    async fn test_malformed_value_loads_empty() {
        let store = SelectionStore::new_in_memory_async().await.unwrap();

        store.set(SELECTION_KEY, "{not json").await.unwrap();
        assert!(store.load_selection().await.is_empty());

        store.set(SELECTION_KEY, r#"{"id": 1}"#).await.unwrap();
        assert!(store.load_selection().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_is_stored_as_empty_array() {
        let store = SelectionStore::new_in_memory_async().await.unwrap();
        store.save_selection(&[product(1, "Cleanser")]).await.unwrap();
        store.save_selection(&[]).await.unwrap();

        assert_eq!(store.get(SELECTION_KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_repeated_ids_keep_first_record() {
        let store = SelectionStore::new_in_memory_async().await.unwrap();
        store
            .set(
                SELECTION_KEY,
                r#"[{"id":1,"name":"First"},{"id":2,"name":"Other"},{"id":1,"name":"Again"}]"#,
            )
            .await
            .unwrap();

        let loaded = store.load_selection().await;

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "First");
        assert_eq!(loaded[1].id, ProductId::Number(2));
    }
}

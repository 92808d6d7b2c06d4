//! Postgres store backend.
//!
//! Documents live in a single `records (collection, key, doc JSONB)` table;
//! exact-match filters map to JSONB containment and `put` upserts via
//! `ON CONFLICT`. Schema is created by the embedded migration.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::{assign_key, FetchResponse, Store, StoreError};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<&Map<String, Value>>,
    ) -> Result<FetchResponse, StoreError> {
        let rows: Vec<(Value,)> = match filter {
            Some(filter) => {
                sqlx::query_as(
                    r#"
                    SELECT doc
                    FROM records
                    WHERE collection = $1 AND doc @> $2
                    ORDER BY key
                    "#,
                )
                .bind(collection)
                .bind(Value::Object(filter.clone()))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT doc
                    FROM records
                    WHERE collection = $1
                    ORDER BY key
                    "#,
                )
                .bind(collection)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::Backend(format!("Failed to fetch records: {}", e)))?;

        let items: Vec<Value> = rows.into_iter().map(|(doc,)| doc).collect();
        let count = items.len();
        Ok(FetchResponse { items, count })
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            r#"
            SELECT doc
            FROM records
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to get record: {}", e)))?;

        Ok(row.map(|(doc,)| doc))
    }

    async fn put(&self, collection: &str, mut doc: Value) -> Result<Value, StoreError> {
        let key = assign_key(&mut doc)?;

        sqlx::query(
            r#"
            INSERT INTO records (collection, key, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(collection)
        .bind(&key)
        .bind(&doc)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to put record: {}", e)))?;

        Ok(doc)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM records
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to delete record: {}", e)))?;

        Ok(())
    }
}

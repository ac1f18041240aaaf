//! Document metadata store.
//!
//! `PgDocumentStore` is the production Postgres implementation;
//! `InMemoryDocumentStore` backs local development and tests and is
//! selectable from configuration like any other backend.

use crate::models::{Document, ExtractedData};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ping the backing store.
    async fn health_check(&self) -> Result<(), AppError>;

    /// Number of documents currently owned by a user.
    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError>;

    async fn insert(&self, document: &Document) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// All documents owned by a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, AppError>;

    /// Overwrite the cached draft on a document the caller owns.
    ///
    /// Single conditional update: the ownership predicate is part of the
    /// write itself, so a row is only ever mutated by its owner. Returns
    /// `None` when no row matched (missing document or ownership mismatch —
    /// the caller decides which by reading the record afterwards).
    async fn update_draft(
        &self,
        id: Uuid,
        user_id: Uuid,
        subject: &str,
        body: &str,
        extracted_data: Option<&ExtractedData>,
    ) -> Result<Option<Document>, AppError>;

    /// Delete a document row. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// PostgreSQL-backed document store.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(row.0)
    }

    async fn insert(&self, document: &Document) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, file_name, storage_path, file_size, page_count, character_count, extracted_text, email_subject, email_body, extracted_data, email_generated_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(&document.file_name)
        .bind(&document.storage_path)
        .bind(document.file_size)
        .bind(document.page_count)
        .bind(document.character_count)
        .bind(document.extracted_text.clone())
        .bind(&document.email_subject)
        .bind(&document.email_body)
        .bind(document.extracted_data.clone())
        .bind(document.email_generated_at)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, AppError> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn update_draft(
        &self,
        id: Uuid,
        user_id: Uuid,
        subject: &str,
        body: &str,
        extracted_data: Option<&ExtractedData>,
    ) -> Result<Option<Document>, AppError> {
        sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET email_subject = $3,
                email_body = $4,
                extracted_data = COALESCE($5, extracted_data),
                email_generated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(subject)
        .bind(body)
        .bind(extracted_data.map(|d| Json(d.clone())))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory document store for development and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|d| d.user_id == user_id).count() as i64)
    }

    async fn insert(&self, document: &Document) -> Result<(), AppError> {
        let mut documents = self.documents.write().await;
        documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Document>, AppError> {
        let documents = self.documents.read().await;
        let mut owned: Vec<Document> = documents
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_draft(
        &self,
        id: Uuid,
        user_id: Uuid,
        subject: &str,
        body: &str,
        extracted_data: Option<&ExtractedData>,
    ) -> Result<Option<Document>, AppError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id) {
            Some(document) if document.user_id == user_id => {
                document.email_subject = Some(subject.to_string());
                document.email_body = Some(body.to_string());
                if let Some(extracted) = extracted_data {
                    document.extracted_data = Some(Json(extracted.clone()));
                }
                let now = Utc::now();
                document.email_generated_at = Some(now);
                document.updated_at = now;
                Ok(Some(document.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(&id).is_some())
    }
}

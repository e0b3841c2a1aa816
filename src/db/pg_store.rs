// src/db/pg_store.rs

//! Store de documentos sobre Postgres: uma tabela JSONB `documents` e
//! notificações `LISTEN/NOTIFY` disparadas por trigger (ver `migrations/`).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgListener, PgPool};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::store::{
    require_object, ChangeEvent, Direction, Document, DocumentStore, Fields, Query,
};
use crate::common::error::AppError;

pub const CHANGE_CHANNEL: &str = "document_changes";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    sender: broadcast::Sender<ChangeEvent>,
}

impl PgDocumentStore {
    /// Conecta o listener e repassa as notificações para o canal broadcast.
    pub async fn connect(pool: PgPool) -> Result<Self, AppError> {
        let (sender, _) = broadcast::channel(256);

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let forward = sender.clone();
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => {
                                let _ = forward.send(event);
                            }
                            Err(e) => tracing::warn!("Notificação inválida em {}: {}", CHANGE_CHANNEL, e),
                        }
                    }
                    Err(e) => {
                        // O PgListener reconecta sozinho na próxima chamada de recv().
                        tracing::error!("🔥 Listener de documentos caiu: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        tracing::info!("✅ Listener de mudanças '{}' ativo", CHANGE_CHANNEL);
        Ok(Self { pool, sender })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, data)| Document { id, data }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        // Filtros de igualdade viram um único `@>` (containment) sobre o JSONB.
        let mut containment = Fields::new();
        for (field, value) in &query.filters {
            containment.insert(field.clone(), value.clone());
        }

        // Campo ausente (NULL do SQL) conta como o menor valor, igual ao store em memória.
        let (order_field, direction, nulls) = match &query.order_by {
            Some((field, Direction::Asc)) => (field.as_str(), "ASC", "NULLS FIRST"),
            Some((field, Direction::Desc)) => (field.as_str(), "DESC", "NULLS LAST"),
            None => ("", "ASC", "NULLS FIRST"),
        };

        // LIMIT NULL no Postgres significa "sem limite".
        let sql = format!(
            "SELECT id, data FROM documents \
             WHERE collection = $1 AND data @> $2 \
             ORDER BY data -> $3 {dir} {nulls}, id {dir} \
             LIMIT $4",
            dir = direction,
            nulls = nulls
        );

        let rows = sqlx::query_as::<_, (String, Value)>(&sql)
            .bind(&query.collection)
            .bind(Value::Object(containment))
            .bind(order_field)
            .bind(query.limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        let data = Value::Object(require_object(data)?);
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(&data)
            .execute(&self.pool)
            .await?;

        Ok(Document { id, data })
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError> {
        let data = Value::Object(require_object(data)?);

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3, updated_at = now() \
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn batch_delete(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        // Um único statement: atômico por definição.
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = ANY($2)")
            .bind(collection)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

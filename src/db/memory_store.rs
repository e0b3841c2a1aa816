// src/db/memory_store.rs

//! Store de documentos em memória (`STORE_BACKEND=memory` e testes).

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::RwLock,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::store::{
    compare_values, require_object, ChangeEvent, Direction, Document, DocumentStore, Fields, Query,
};
use crate::common::error::AppError;

/// Registro das escritas recebidas, na ordem em que chegaram.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create { collection: String, id: String },
    Set { collection: String, id: String },
    Update { collection: String, id: String },
    Delete { collection: String, id: String },
    BatchDelete { collection: String, ids: Vec<String> },
}

type Collections = HashMap<String, BTreeMap<String, Value>>;

pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    write_log: RwLock<Vec<WriteOp>>,
    failing: RwLock<HashSet<String>>,
    sender: broadcast::Sender<ChangeEvent>,
}

fn poisoned() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("lock do store em memória envenenado"))
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            collections: RwLock::new(HashMap::new()),
            write_log: RwLock::new(Vec::new()),
            failing: RwLock::new(HashSet::new()),
            sender,
        }
    }

    pub fn write_log(&self) -> Vec<WriteOp> {
        self.write_log
            .read()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn clear_write_log(&self) {
        if let Ok(mut log) = self.write_log.write() {
            log.clear();
        }
    }

    /// Faz toda escrita na coleção falhar (simula rede instável).
    pub fn fail_writes_on(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(collection.to_string());
        }
    }

    pub fn restore_writes(&self) {
        if let Ok(mut failing) = self.failing.write() {
            failing.clear();
        }
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    fn check_writable(&self, collection: &str) -> Result<(), AppError> {
        let failing = self.failing.read().map_err(|_| poisoned())?;
        if failing.contains(collection) {
            return Err(AppError::StorageError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("escrita recusada em '{}'", collection),
            )));
        }
        Ok(())
    }

    fn record(&self, op: WriteOp) -> Result<(), AppError> {
        self.write_log.write().map_err(|_| poisoned())?.push(op);
        Ok(())
    }

    fn notify(&self, collection: &str, id: &str) {
        // Sem assinantes o envio falha; não é erro.
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            document_id: id.to_string(),
        });
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let mut docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some((field, direction)) = &query.order_by {
            docs.sort_by(|a, b| {
                let left = a.data.get(field).unwrap_or(&Value::Null);
                let right = b.data.get(field).unwrap_or(&Value::Null);
                let ord = compare_values(left, right).then_with(|| a.id.cmp(&b.id));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError> {
        self.check_writable(collection)?;
        let fields = require_object(data)?;
        let id = Uuid::new_v4().to_string();
        let data = Value::Object(fields);

        self.collections
            .write()
            .map_err(|_| poisoned())?
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data.clone());

        self.record(WriteOp::Create {
            collection: collection.to_string(),
            id: id.clone(),
        })?;
        self.notify(collection, &id);
        Ok(Document { id, data })
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError> {
        self.check_writable(collection)?;
        let fields = require_object(data)?;

        self.collections
            .write()
            .map_err(|_| poisoned())?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), Value::Object(fields));

        self.record(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        self.notify(collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        self.check_writable(collection)?;
        {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| AppError::ResourceNotFound(format!("{}/{}", collection, id)))?;

            if let Value::Object(map) = existing {
                map.extend(fields);
            }
        }

        self.record(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        self.notify(collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.check_writable(collection)?;
        if let Some(docs) = self
            .collections
            .write()
            .map_err(|_| poisoned())?
            .get_mut(collection)
        {
            docs.remove(id);
        }

        self.record(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        self.notify(collection, id);
        Ok(())
    }

    async fn batch_delete(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        self.check_writable(collection)?;
        // Um único lock de escrita: o lote é aplicado inteiro ou não é aplicado.
        if let Some(docs) = self
            .collections
            .write()
            .map_err(|_| poisoned())?
            .get_mut(collection)
        {
            for id in ids {
                docs.remove(id);
            }
        }

        self.record(WriteOp::BatchDelete {
            collection: collection.to_string(),
            ids: ids.to_vec(),
        })?;
        for id in ids {
            self.notify(collection, id);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (id, owner, at) in [("a", "u1", 30), ("b", "u1", 10), ("c", "u2", 20), ("d", "u1", 20)] {
            store
                .set("tickets", id, json!({ "userId": owner, "lastUpdated": at }))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = seeded().await;
        let query = Query::collection("tickets")
            .where_eq("userId", "u1")
            .order_by("lastUpdated", Direction::Desc)
            .limit(2);

        let ids: Vec<String> = store.query(&query).await.unwrap().into_iter().map(|d| d.id).collect();

        assert_eq!(ids, vec!["a", "d"]);
    }

    #[tokio::test]
    async fn documents_without_the_order_field_sort_as_lowest() {
        let store = seeded().await;
        store.set("tickets", "e", json!({ "userId": "u1" })).await.unwrap();

        let newest_first = Query::collection("tickets")
            .where_eq("userId", "u1")
            .order_by("lastUpdated", Direction::Desc)
            .limit(3);
        let ids: Vec<String> = store.query(&newest_first).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "d", "b"]);

        let oldest_first = Query::collection("tickets")
            .where_eq("userId", "u1")
            .order_by("lastUpdated", Direction::Asc)
            .limit(1);
        let ids: Vec<String> = store.query(&oldest_first).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["e"]);
    }

    #[tokio::test]
    async fn update_merges_fields_and_rejects_missing_documents() {
        let store = seeded().await;
        let mut fields = Fields::new();
        fields.insert("status".into(), json!("en-cours"));

        store.update("tickets", "a", fields.clone()).await.unwrap();
        let doc = store.get("tickets", "a").await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "en-cours");
        assert_eq!(doc.data["userId"], "u1");

        assert_matches!(
            store.update("tickets", "zzz", fields).await,
            Err(AppError::ResourceNotFound(_))
        );
    }

    #[tokio::test]
    async fn batch_delete_is_a_single_logged_operation() {
        let store = seeded().await;
        store.clear_write_log();
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        store.batch_delete("tickets", &ids).await.unwrap();

        assert_eq!(
            store.write_log(),
            vec![WriteOp::BatchDelete { collection: "tickets".into(), ids }]
        );
        assert_eq!(store.count("tickets"), 1);
    }

    #[tokio::test]
    async fn mutations_publish_change_events() {
        let store = MemoryDocumentStore::new();
        let mut changes = store.changes();

        let doc = store.create("surveyResult", json!({ "qrCodeData": "X" })).await.unwrap();

        let event = changes.recv().await.unwrap();
        assert_eq!(event.collection, "surveyResult");
        assert_eq!(event.document_id, doc.id);
    }

    #[tokio::test]
    async fn injected_failures_refuse_writes() {
        let store = seeded().await;
        store.fail_writes_on("tickets");

        assert_matches!(store.delete("tickets", "a").await, Err(AppError::StorageError(_)));
        assert!(store.get("tickets", "a").await.unwrap().is_some());

        store.restore_writes();
        store.delete("tickets", "a").await.unwrap();
        assert!(store.get("tickets", "a").await.unwrap().is_none());
    }
}

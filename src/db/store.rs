// src/db/store.rs

//! Contrato do store de documentos remoto.
//!
//! Documentos são objetos JSON agrupados em coleções endereçadas por caminho
//! (`tickets`, `partners/{id}/products`, ...). Toda mutação publica um
//! `ChangeEvent`, que alimenta os espelhos ao vivo.

use std::{cmp::Ordering, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::common::error::AppError;

pub type Fields = Map<String, Value>;

pub type SharedStore = Arc<dyn DocumentStore>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decodifica o documento; o `id` do documento entra no objeto antes.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(data)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// O documento satisfaz todos os filtros de igualdade?
    pub fn matches(&self, data: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| data.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: String,
    pub document_id: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError>;

    /// Cria um documento com id gerado.
    async fn create(&self, collection: &str, data: Value) -> Result<Document, AppError>;

    /// Cria ou substitui o documento inteiro.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError>;

    /// Mescla campos num documento existente. `ResourceNotFound` se não existir.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;

    /// Remove todos os ids numa única operação atômica.
    async fn batch_delete(&self, collection: &str, ids: &[String]) -> Result<(), AppError>;

    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Ordem total do store em memória, a mesma do `jsonb` no Postgres:
/// null < texto < número < bool < array < objeto.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::String(_) => 1,
            Value::Number(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Lê e decodifica um documento.
pub async fn get_as<T: DeserializeOwned>(
    store: &SharedStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError> {
    match store.get(collection, id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

pub fn require_object(data: Value) -> Result<Fields, AppError> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidInput(format!(
            "documento deve ser um objeto JSON, recebido: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_injects_document_id() {
        #[derive(Deserialize)]
        struct Named {
            id: String,
            name: String,
        }

        let doc = Document {
            id: "abc".into(),
            data: json!({ "id": "stale", "name": "Awa" }),
        };
        let named: Named = doc.decode().unwrap();

        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "Awa");
    }

    #[test]
    fn numbers_sort_numerically_not_lexically() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn mixed_types_follow_jsonb_ordering() {
        assert_eq!(compare_values(&Value::Null, &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("9"), &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!(1), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!([])), Ordering::Less);
        assert_eq!(compare_values(&json!([1]), &json!({})), Ordering::Less);
    }
}

// src/db/product_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{get_as, Direction, Fields, Query, SharedStore},
    },
    models::product::{Product, ProductStatus},
    services::mirror::fetch_snapshot,
};

// Produtos ficam na subcoleção do parceiro: `partners/{id}/products`.
#[derive(Clone)]
pub struct ProductRepository {
    store: SharedStore,
}

impl ProductRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        partner_id: &str,
        name: &str,
        price: Decimal,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<Product, AppError> {
        let data = json!({
            "partnerId": partner_id,
            "name": name.trim(),
            "price": price,
            "description": description,
            "status": ProductStatus::Pending,
            "createdAt": timestamp::to_value(now),
        });
        let doc = self.store.create(&collections::partner_products(partner_id), data).await?;
        doc.decode()
    }

    pub async fn find_by_id(&self, partner_id: &str, id: &str) -> Result<Option<Product>, AppError> {
        get_as(&self.store, &collections::partner_products(partner_id), id).await
    }

    pub async fn list(&self, partner_id: &str) -> Result<Vec<Product>, AppError> {
        let query = Query::collection(collections::partner_products(partner_id))
            .order_by("createdAt", Direction::Desc);
        fetch_snapshot(&self.store, &query).await
    }

    pub async fn update_fields(&self, partner_id: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store.update(&collections::partner_products(partner_id), id, fields).await
    }

    pub async fn delete(&self, partner_id: &str, id: &str) -> Result<(), AppError> {
        self.store.delete(&collections::partner_products(partner_id), id).await
    }
}

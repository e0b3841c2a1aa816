// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::timestamp,
    models::status::{status_taxonomy, StatusBadge},
};

status_taxonomy! {
    pub enum ProductStatus: "product" {
        Pending => "pending", "#FFC107", "hourglass-empty";
        Approved => "approved", "#4CAF50", "verified";
        Rejected => "rejected", "#F44336", "block";
    }
}

// Produto publicado por um parceiro (`partners/{id}/products`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    #[serde(default)]
    pub partner_id: String,

    #[schema(example = "Thiéboudienne")]
    pub name: String,

    #[schema(example = "3500.00")]
    pub price: Decimal,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[schema(value_type = String, example = "pending")]
    pub status: ProductStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub badge: StatusBadge,
}

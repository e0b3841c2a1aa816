// src/db/finance_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{Direction, Query, SharedStore},
    },
    models::finance::Payment,
    services::mirror::fetch_snapshot,
};

// Receitas lançadas manualmente (coleção `payments`).
#[derive(Clone)]
pub struct FinanceRepository {
    store: SharedStore,
}

impl FinanceRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_payment(
        &self,
        partner_id: &str,
        amount: Decimal,
        description: &str,
        paid_at: DateTime<Utc>,
        recorded_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Payment, AppError> {
        let data = json!({
            "partnerId": partner_id,
            "amount": amount,
            "description": description.trim(),
            "paidAt": timestamp::to_value(paid_at),
            "recordedBy": recorded_by,
            "createdAt": timestamp::to_value(now),
        });
        let doc = self.store.create(collections::PAYMENTS, data).await?;
        doc.decode()
    }

    pub async fn list_for_partner(&self, partner_id: &str) -> Result<Vec<Payment>, AppError> {
        let query = Query::collection(collections::PAYMENTS)
            .where_eq("partnerId", partner_id)
            .order_by("paidAt", Direction::Desc);
        fetch_snapshot(&self.store, &query).await
    }
}

// src/models/finance.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::{error::AppError, timestamp};

// Receita lançada manualmente para um parceiro (coleção `payments`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,

    pub partner_id: String,

    #[schema(example = "150.50")]
    pub amount: Decimal,

    #[serde(default)]
    #[schema(example = "Commission mai")]
    pub description: String,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub paid_at: DateTime<Utc>,

    #[serde(default)]
    pub recorded_by: String,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub partner_id: String,
    #[schema(example = "1500.50")]
    pub total: Decimal,
    pub count: usize,
    #[schema(value_type = Option<i64>)]
    #[serde(with = "timestamp::millis_option")]
    pub last_payment_at: Option<DateTime<Utc>>,
}

impl RevenueSummary {
    /// Soma exata; estouro do `Decimal` vira erro em vez de pânico.
    pub fn from_payments(partner_id: &str, payments: &[Payment]) -> Result<Self, AppError> {
        let total = payments
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
            .ok_or_else(|| AppError::DataIntegrity(format!("total de receitas do parceiro {} excede o limite", partner_id)))?;

        Ok(Self {
            partner_id: partner_id.to_string(),
            total,
            count: payments.len(),
            last_payment_at: payments.iter().map(|p| p.paid_at).max(),
        })
    }
}

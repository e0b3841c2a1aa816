// src/services/finance_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    db::{FinanceRepository, PartnerRepository},
    models::{
        auth::Session,
        finance::{Payment, RevenueSummary},
        partner::Partner,
    },
};

// Teto por lançamento; mantém a soma dos extratos longe do limite do `Decimal`.
const MAX_PAYMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.positive_amount".into());
        return Err(err);
    }
    if *val > MAX_PAYMENT_AMOUNT {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.amount_too_large".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub partner_id: String,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 150.5)]
    pub amount: Decimal,

    #[serde(default)]
    #[schema(example = "Commission mai")]
    pub description: String,

    // Milissegundos; ausente = agora.
    #[serde(default)]
    pub paid_at: Option<i64>,
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
    partner_repo: PartnerRepository,
}

impl FinanceService {
    pub fn new(repo: FinanceRepository, partner_repo: PartnerRepository) -> Self {
        Self { repo, partner_repo }
    }

    /// Lançamento manual de receita, feito pelo admin.
    pub async fn record_payment(&self, session: &Session, payload: &RecordPaymentPayload) -> Result<Payment, AppError> {
        session.require_admin()?;
        payload.validate()?;
        self.partner(&payload.partner_id).await?;

        let now = Utc::now();
        let paid_at = match payload.paid_at {
            Some(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| AppError::InvalidInput(format!("paidAt inválido: {}", millis)))?,
            None => now,
        };

        let payment = self
            .repo
            .create_payment(&payload.partner_id, payload.amount, &payload.description, paid_at, &session.user_id, now)
            .await?;
        tracing::info!("💰 Receita de {} lançada para {}", payment.amount, payment.partner_id);
        Ok(payment)
    }

    pub async fn list(&self, session: &Session, partner_id: &str) -> Result<Vec<Payment>, AppError> {
        session.require_partner_or_admin(partner_id)?;
        self.repo.list_for_partner(partner_id).await
    }

    pub async fn summary(&self, session: &Session, partner_id: &str) -> Result<RevenueSummary, AppError> {
        let payments = self.list(session, partner_id).await?;
        RevenueSummary::from_payments(partner_id, &payments)
    }

    /// Dados do extrato: parceiro, lançamentos e totais.
    pub async fn statement(
        &self,
        session: &Session,
        partner_id: &str,
    ) -> Result<(Partner, Vec<Payment>, RevenueSummary), AppError> {
        let payments = self.list(session, partner_id).await?;
        let partner = self.partner(partner_id).await?;
        let summary = RevenueSummary::from_payments(partner_id, &payments)?;
        Ok((partner, payments, summary))
    }

    async fn partner(&self, partner_id: &str) -> Result<Partner, AppError> {
        self.partner_repo
            .find_by_id(partner_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("parceiro {}", partner_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, memory_store, partner, seed};
    use assert_matches::assert_matches;
    use serde_json::json;

    async fn setup() -> FinanceService {
        let (store, shared) = memory_store();
        seed(&store, "partners", "p1", json!({ "name": "Chez Awa" })).await;
        FinanceService::new(FinanceRepository::new(shared.clone()), PartnerRepository::new(shared))
    }

    fn payload(partner_id: &str, amount: &str, paid_at: i64) -> RecordPaymentPayload {
        RecordPaymentPayload {
            partner_id: partner_id.into(),
            amount: amount.parse().unwrap(),
            description: "Commission".into(),
            paid_at: Some(paid_at),
        }
    }

    #[tokio::test]
    async fn admin_records_and_partner_reads_the_summary() {
        let service = setup().await;
        service.record_payment(&admin(), &payload("p1", "150.50", 1_000)).await.unwrap();
        service.record_payment(&admin(), &payload("p1", "49.50", 2_000)).await.unwrap();

        let summary = service.summary(&partner("pu", "p1"), "p1").await.unwrap();

        assert_eq!(summary.total, Decimal::from(200));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.last_payment_at, DateTime::from_timestamp_millis(2_000));
        let listed = service.list(&partner("pu", "p1"), "p1").await.unwrap();
        assert_eq!(listed[0].paid_at, DateTime::from_timestamp_millis(2_000).unwrap());
    }

    #[tokio::test]
    async fn amounts_must_be_positive_and_partners_must_exist() {
        let service = setup().await;

        assert_matches!(
            service.record_payment(&admin(), &payload("p1", "0", 1)).await,
            Err(AppError::ValidationError(_))
        );
        assert_matches!(
            service.record_payment(&admin(), &payload("p1", "70000000000000000000000000000", 1)).await,
            Err(AppError::ValidationError(_))
        );
        assert_matches!(
            service.record_payment(&admin(), &payload("p1", "1000000001", 1)).await,
            Err(AppError::ValidationError(_))
        );
        assert!(service.record_payment(&admin(), &payload("p1", "1000000000", 1)).await.is_ok());
        assert_matches!(
            service.record_payment(&admin(), &payload("ghost", "10", 1)).await,
            Err(AppError::ResourceNotFound(_))
        );
        assert_matches!(
            service.record_payment(&partner("pu", "p1"), &payload("p1", "10", 1)).await,
            Err(AppError::AccessDenied)
        );
        assert_matches!(
            service.summary(&partner("pu", "p2"), "p1").await,
            Err(AppError::AccessDenied)
        );
    }
}

// src/services/coupon_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::{
    common::{error::AppError, i18n::I18nStore, timestamp},
    db::{store::Fields, CouponRepository},
    models::{
        auth::Session,
        coupon::{CouponView, RedeemOutcome, RedeemOutcomeKind, SurveyCoupon},
        status::StatusTaxonomy,
    },
};

#[derive(Clone)]
pub struct CouponService {
    repo: CouponRepository,
    i18n: Arc<I18nStore>,
}

impl CouponService {
    pub fn new(repo: CouponRepository, i18n: Arc<I18nStore>) -> Self {
        Self { repo, i18n }
    }

    /// Prévia do cupom escaneado, sem escrita.
    pub async fn lookup(&self, session: &Session, scanned: &str, lang: &str) -> Result<CouponView, AppError> {
        require_scanner(session)?;
        let coupon = self.find_unique(scanned).await?;
        Ok(self.view(coupon, lang))
    }

    /// Marca o cupom como usado. Cupom já usado devolve um resultado
    /// informativo e nada é gravado.
    pub async fn redeem(&self, session: &Session, scanned: &str, lang: &str) -> Result<RedeemOutcome, AppError> {
        require_scanner(session)?;
        let mut coupon = self.find_unique(scanned).await?;

        if coupon.is_redeemed {
            return Ok(RedeemOutcome {
                outcome: RedeemOutcomeKind::AlreadyRedeemed,
                message: self.i18n.translate(lang, "outcome.coupon.already_redeemed"),
                badge: coupon.state_at(Utc::now()).badge(lang, &self.i18n),
                coupon,
            });
        }

        let now = Utc::now();
        let actor = session.partner_id.clone().unwrap_or_else(|| session.user_id.clone());
        let mut fields = Fields::new();
        fields.insert("isRedeemed".into(), json!(true));
        fields.insert("redeemedBy".into(), json!(actor));
        fields.insert("redeemedAt".into(), timestamp::to_value(now));
        self.repo.update_fields(&coupon.id, fields).await?;

        coupon.is_redeemed = true;
        coupon.redeemed_by = Some(actor);
        coupon.redeemed_at = Some(now);
        tracing::info!("🎟️ Cupom {} resgatado por {}", coupon.id, session.user_id);

        Ok(RedeemOutcome {
            outcome: RedeemOutcomeKind::Redeemed,
            message: self.i18n.translate(lang, "outcome.coupon.redeemed"),
            badge: coupon.state_at(now).badge(lang, &self.i18n),
            coupon,
        })
    }

    /// Exclusão irreversível: exige `confirm = true`.
    pub async fn delete(&self, session: &Session, id: &str, confirm: bool) -> Result<(), AppError> {
        session.require_admin()?;
        if !confirm {
            return Err(AppError::ConfirmationRequired);
        }
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(AppError::ResourceNotFound(format!("cupom {}", id)));
        }

        self.repo.delete(id).await?;
        tracing::info!("🗑️ Cupom {} apagado por {}", id, session.user_id);
        Ok(())
    }

    pub async fn list_for_user(&self, session: &Session, user_id: &str, lang: &str) -> Result<Vec<CouponView>, AppError> {
        if session.user_id != user_id && !session.is_staff() {
            return Err(AppError::AccessDenied);
        }
        let coupons = self.repo.list_for_user(user_id).await?;
        Ok(coupons.into_iter().map(|coupon| self.view(coupon, lang)).collect())
    }

    /// Zero documentos: cupom inválido. Mais de um: dado inconsistente.
    async fn find_unique(&self, scanned: &str) -> Result<SurveyCoupon, AppError> {
        if scanned.is_empty() {
            return Err(AppError::InvalidCoupon);
        }

        let mut matches = self.repo.find_by_code(scanned).await?;
        match matches.len() {
            0 => Err(AppError::InvalidCoupon),
            1 => Ok(matches.remove(0)),
            n => {
                tracing::error!("❌ {} cupons com o mesmo código escaneado", n);
                Err(AppError::AmbiguousCoupon(n))
            }
        }
    }

    fn view(&self, coupon: SurveyCoupon, lang: &str) -> CouponView {
        CouponView {
            badge: coupon.state_at(Utc::now()).badge(lang, &self.i18n),
            coupon,
        }
    }
}

// Quem escaneia cupons: parceiros (no balcão) e admins.
fn require_scanner(session: &Session) -> Result<(), AppError> {
    if session.is_admin {
        return Ok(());
    }
    session.require_partner().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory_store::MemoryDocumentStore, store::DocumentStore},
        models::coupon::CouponState,
        test_support::{admin, customer, i18n, memory_store, partner, seed},
    };
    use assert_matches::assert_matches;

    async fn setup() -> (Arc<MemoryDocumentStore>, CouponService) {
        let (store, shared) = memory_store();
        let service = CouponService::new(CouponRepository::new(shared), i18n());

        seed(
            &store,
            "surveyResult",
            "c1",
            json!({ "qrCodeData": "CPN-1", "isRedeemed": false, "userId": "u1",
                    "couponDetails": { "type": "percentage", "value": 10 } }),
        )
        .await;
        seed(&store, "surveyResult", "c2", json!({ "qrCodeData": "CPN-2", "isRedeemed": true, "userId": "u1" })).await;
        seed(&store, "surveyResult", "c3", json!({ "qrCodeData": "DUP", "userId": "u2" })).await;
        seed(&store, "surveyResult", "c4", json!({ "qrCodeData": "DUP", "userId": "u3" })).await;
        store.clear_write_log();
        (store, service)
    }

    #[tokio::test]
    async fn redeem_flips_the_flag_once() {
        let (store, service) = setup().await;
        let scanner = partner("pu", "p1");

        let first = service.redeem(&scanner, "CPN-1", "en").await.unwrap();
        assert_eq!(first.outcome, RedeemOutcomeKind::Redeemed);
        assert_eq!(first.badge.code, CouponState::Redeemed.as_str());
        let doc = store.get("surveyResult", "c1").await.unwrap().unwrap();
        assert_eq!(doc.data["isRedeemed"], true);
        assert_eq!(doc.data["redeemedBy"], "p1");
        assert!(doc.data["redeemedAt"].is_i64());

        store.clear_write_log();
        let second = service.redeem(&scanner, "CPN-1", "en").await.unwrap();
        assert_eq!(second.outcome, RedeemOutcomeKind::AlreadyRedeemed);
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn already_used_coupon_is_reported_without_writing() {
        let (store, service) = setup().await;

        let outcome = service.redeem(&admin(), "CPN-2", "fr").await.unwrap();

        assert_eq!(outcome.outcome, RedeemOutcomeKind::AlreadyRedeemed);
        assert_eq!(outcome.message, "Ce coupon a déjà été utilisé");
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn zero_or_many_matches_are_errors() {
        let (store, service) = setup().await;
        let scanner = partner("pu", "p1");

        assert_matches!(service.redeem(&scanner, "NOPE", "en").await, Err(AppError::InvalidCoupon));
        assert_matches!(service.redeem(&scanner, "cpn-1", "en").await, Err(AppError::InvalidCoupon));
        assert_matches!(service.redeem(&scanner, "DUP", "en").await, Err(AppError::AmbiguousCoupon(2)));
        assert_matches!(service.lookup(&scanner, "DUP", "en").await, Err(AppError::AmbiguousCoupon(2)));
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn customers_cannot_scan() {
        let (_, service) = setup().await;

        assert_matches!(
            service.lookup(&customer("u1"), "CPN-1", "en").await,
            Err(AppError::PartnerLinkMissing)
        );
    }

    #[tokio::test]
    async fn delete_requires_explicit_confirmation() {
        let (store, service) = setup().await;

        assert_matches!(service.delete(&admin(), "c1", false).await, Err(AppError::ConfirmationRequired));
        assert_eq!(store.count("surveyResult"), 4);

        service.delete(&admin(), "c1", true).await.unwrap();
        assert_eq!(store.count("surveyResult"), 3);
        assert_matches!(service.delete(&admin(), "c1", true).await, Err(AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn users_see_their_own_coupons() {
        let (_, service) = setup().await;

        let mine = service.list_for_user(&customer("u1"), "u1", "en").await.unwrap();
        assert_eq!(mine.len(), 2);

        assert_matches!(
            service.list_for_user(&customer("u2"), "u1", "en").await,
            Err(AppError::AccessDenied)
        );
    }
}

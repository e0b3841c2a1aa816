// src/models/coupon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    common::timestamp,
    models::status::{status_taxonomy, StatusBadge},
};

status_taxonomy! {
    /// Estado de exibição do cupom (derivado, não gravado).
    pub enum CouponState: "coupon" {
        Available => "available", "#4CAF50", "local-offer";
        Redeemed => "redeemed", "#9E9E9F", "done-all";
        Expired => "expired", "#F44336", "timer-off";
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponDetails {
    #[serde(rename = "type", default)]
    #[schema(example = "percentage")]
    pub kind: String,

    // Número (10) ou texto ("10%"), como vier do questionário.
    #[serde(default)]
    #[schema(value_type = Object, example = 10)]
    pub value: Value,

    #[serde(with = "timestamp::millis_option", default)]
    #[schema(value_type = Option<i64>)]
    pub expiry_date: Option<DateTime<Utc>>,
}

// Documento de `surveyResult`: o cupom ganho ao responder um questionário.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCoupon {
    pub id: String,

    #[serde(default)]
    pub qr_code_data: String,

    #[serde(default)]
    pub is_redeemed: bool,

    #[serde(default)]
    pub coupon_details: CouponDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_by: Option<String>,

    #[serde(with = "timestamp::millis_option", default)]
    #[schema(value_type = Option<i64>)]
    pub redeemed_at: Option<DateTime<Utc>>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

impl SurveyCoupon {
    pub fn state_at(&self, now: DateTime<Utc>) -> CouponState {
        if self.is_redeemed {
            return CouponState::Redeemed;
        }
        match self.coupon_details.expiry_date {
            Some(expiry) if expiry < now => CouponState::Expired,
            _ => CouponState::Available,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RedeemOutcomeKind {
    Redeemed,
    AlreadyRedeemed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    pub coupon: SurveyCoupon,
    pub badge: StatusBadge,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemOutcome {
    pub outcome: RedeemOutcomeKind,
    pub message: String,
    pub coupon: SurveyCoupon,
    pub badge: StatusBadge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn state_prefers_redeemed_over_expired() {
        let now = Utc::now();
        let mut coupon: SurveyCoupon = serde_json::from_value(json!({
            "id": "c1",
            "qrCodeData": "Q",
            "couponDetails": { "type": "percentage", "value": 10, "expiryDate": (now - Duration::days(1)).timestamp_millis() }
        }))
        .unwrap();

        assert_eq!(coupon.state_at(now), CouponState::Expired);
        coupon.is_redeemed = true;
        assert_eq!(coupon.state_at(now), CouponState::Redeemed);
    }

    #[test]
    fn missing_details_decode_as_available() {
        let coupon: SurveyCoupon = serde_json::from_value(json!({ "id": "c2", "qrCodeData": "Q" })).unwrap();

        assert!(!coupon.is_redeemed);
        assert_eq!(coupon.state_at(Utc::now()), CouponState::Available);
    }
}

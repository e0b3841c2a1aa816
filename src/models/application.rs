// src/models/application.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::timestamp,
    models::status::{status_taxonomy, StatusBadge},
    services::intent_log::IntentReport,
};

status_taxonomy! {
    /// Status de uma candidatura de parceiro.
    pub enum ApplicationStatus: "application" {
        Pending => "pending", "#FFC107", "hourglass-empty";
        OnWork => "on_work", "#2196F3", "work";
        Accepted => "accepted", "#4CAF50", "check-circle";
        Rejected => "rejected", "#F44336", "cancel";
    }
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Estas transições convidam o admin a avisar o candidato por e-mail.
    pub fn notifies_applicant(&self) -> bool {
        self.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantInfo {
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Awa Diallo")]
    pub name: String,

    #[validate(email(message = "validation.email"))]
    #[schema(example = "awa@example.com")]
    pub email: String,

    #[serde(default)]
    #[schema(example = "+221 77 000 00 00")]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Chez Awa")]
    pub business_name: String,

    #[serde(default)]
    #[schema(example = "restaurant")]
    pub category: String,

    #[serde(default)]
    #[schema(example = "12 rue des Fleurs, Dakar")]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerApplication {
    pub id: String,

    pub applicant_info: ApplicantInfo,

    pub business_info: BusinessInfo,

    #[serde(default)]
    #[schema(value_type = String, example = "pending")]
    pub status: ApplicationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListItem {
    #[serde(flatten)]
    pub application: PartnerApplication,
    pub badge: StatusBadge,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusReport {
    pub application: PartnerApplication,
    pub badge: StatusBadge,
    // Link mailto: montado para o candidato (aceite/recusa).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
    // false quando não há app de e-mail disponível; o status já foi gravado.
    pub mail_dispatched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion: Option<IntentReport>,
}

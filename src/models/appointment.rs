// src/models/appointment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, timestamp},
    models::status::{status_taxonomy, StatusBadge},
};

status_taxonomy! {
    pub enum AppointmentStatus: "appointment" {
        Scheduled => "scheduled", "#2196F3", "event";
        Rescheduled => "rescheduled", "#FF9800", "update";
        Confirmed => "confirmed", "#4CAF50", "event-available";
        Cancelled => "cancelled", "#F44336", "event-busy";
    }
}

impl AppointmentStatus {
    /// `scheduled` e `rescheduled` ainda aguardam o scan.
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Rescheduled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Confirm,
    Cancel,
    Reschedule,
}

impl AppointmentAction {
    pub fn target(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Confirm => AppointmentStatus::Confirmed,
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Reschedule => AppointmentStatus::Rescheduled,
        }
    }
}

/// Resultado de uma ação: aplicar o novo status ou não fazer nada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Apply(AppointmentStatus),
    AlreadyConfirmed,
    AlreadyCancelled,
}

/// Máquina de estados do agendamento.
///
/// `unconfirmed -> confirmed` e `unconfirmed -> cancelled`; nada sai de
/// `confirmed`/`cancelled`. Agir sobre um estado final é um no-op
/// informativo, não um erro. Status desconhecido é erro de transição.
pub fn transition(current: &AppointmentStatus, action: AppointmentAction) -> Result<Transition, AppError> {
    match current {
        AppointmentStatus::Confirmed => Ok(Transition::AlreadyConfirmed),
        AppointmentStatus::Cancelled => Ok(Transition::AlreadyCancelled),
        s if s.is_unconfirmed() => Ok(Transition::Apply(action.target())),
        other => Err(AppError::InvalidTransition {
            from: other.to_string(),
            to: action.target().to_string(),
        }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeData {
    #[serde(default)]
    pub qr_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,

    #[serde(default)]
    pub partner_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,

    // Cliente dono do agendamento (quem exibe o QR code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default)]
    #[schema(value_type = String, example = "scheduled")]
    pub status: AppointmentStatus,

    // O segredo esperado nunca vai para a resposta.
    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub code_data: CodeData,

    #[serde(default)]
    pub client_names: Vec<String>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub scheduled_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,

    #[serde(with = "timestamp::millis_option", default)]
    #[schema(value_type = Option<i64>)]
    pub confirmed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,

    #[serde(with = "timestamp::millis_option", default)]
    #[schema(value_type = Option<i64>)]
    pub cancelled_at: Option<DateTime<Utc>>,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentOutcomeKind {
    Confirmed,
    Cancelled,
    Rescheduled,
    AlreadyConfirmed,
    AlreadyCancelled,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentOutcome {
    pub outcome: AppointmentOutcomeKind,
    pub message: String,
    pub appointment: Appointment,
    pub badge: StatusBadge,
    // Escritas de companhia que ficaram pendentes no log de intenções.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_intent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unconfirmed_states_accept_confirm_and_cancel() {
        for current in [AppointmentStatus::Scheduled, AppointmentStatus::Rescheduled] {
            assert_eq!(
                transition(&current, AppointmentAction::Confirm).unwrap(),
                Transition::Apply(AppointmentStatus::Confirmed)
            );
            assert_eq!(
                transition(&current, AppointmentAction::Cancel).unwrap(),
                Transition::Apply(AppointmentStatus::Cancelled)
            );
        }
    }

    #[test]
    fn terminal_states_are_informational_no_ops() {
        for action in [AppointmentAction::Confirm, AppointmentAction::Cancel, AppointmentAction::Reschedule] {
            assert_eq!(
                transition(&AppointmentStatus::Confirmed, action).unwrap(),
                Transition::AlreadyConfirmed
            );
            assert_eq!(
                transition(&AppointmentStatus::Cancelled, action).unwrap(),
                Transition::AlreadyCancelled
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!(
            transition(&AppointmentStatus::from("archived"), AppointmentAction::Confirm),
            Err(AppError::InvalidTransition { .. })
        );
    }

    #[test]
    fn secret_is_read_but_never_serialized() {
        let raw = serde_json::json!({
            "id": "a1",
            "partnerId": "p1",
            "status": "scheduled",
            "codeData": { "qrContent": "SECRET-123" }
        });
        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        assert_eq!(appointment.code_data.qr_content.as_deref(), Some("SECRET-123"));
        let out = serde_json::to_string(&appointment).unwrap();
        assert!(!out.contains("SECRET-123"));
    }
}

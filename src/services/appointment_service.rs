// src/services/appointment_service.rs

//! Confirmação por scan e demais transições de agendamento.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use qrcode::{render::svg, QrCode};
use serde_json::json;

use crate::{
    common::{error::AppError, i18n::I18nStore, timestamp},
    db::{collections, store::Fields, AppointmentRepository},
    models::{
        appointment::{
            transition, Appointment, AppointmentAction, AppointmentOutcome, AppointmentOutcomeKind,
            Transition,
        },
        auth::Session,
        intent::CompanionWrite,
        status::StatusTaxonomy,
    },
    services::intent_log::IntentLog,
};

#[derive(Clone)]
pub struct AppointmentService {
    repo: AppointmentRepository,
    intent_log: IntentLog,
    i18n: Arc<I18nStore>,
    page_size: usize,
}

impl AppointmentService {
    pub fn new(
        repo: AppointmentRepository,
        intent_log: IntentLog,
        i18n: Arc<I18nStore>,
        page_size: usize,
    ) -> Self {
        Self { repo, intent_log, i18n, page_size }
    }

    /// Parceiro vê os próprios agendamentos; admin vê os de qualquer parceiro.
    pub async fn list(&self, session: &Session, partner_id: Option<&str>) -> Result<Vec<Appointment>, AppError> {
        let scope = if session.is_admin {
            partner_id
        } else {
            Some(session.require_partner()?)
        };
        self.repo.list(scope, self.page_size).await
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<Appointment, AppError> {
        let appointment = self.load(id).await?;
        let is_client = appointment.user_id.as_deref() == Some(session.user_id.as_str());
        if is_client || session.require_partner_or_admin(&appointment.partner_id).is_ok() {
            Ok(appointment)
        } else {
            Err(AppError::AccessDenied)
        }
    }

    /// O parceiro escaneia o QR do cliente. O status é relido antes de tudo:
    /// agendamento já finalizado devolve um resultado informativo sem escrita.
    pub async fn confirm_by_scan(
        &self,
        session: &Session,
        id: &str,
        scanned: &str,
        lang: &str,
    ) -> Result<AppointmentOutcome, AppError> {
        let appointment = self.load(id).await?;
        session.require_partner_or_admin(&appointment.partner_id)?;

        let target = match transition(&appointment.status, AppointmentAction::Confirm)? {
            Transition::Apply(target) => target,
            other => return Ok(self.no_op(appointment, other, lang)),
        };

        let expected = appointment
            .code_data
            .qr_content
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::DataIntegrity(format!("agendamento {} sem codeData.qrContent", id)))?;

        // Comparação exata, sem normalização.
        if scanned != expected {
            tracing::warn!("⚠️ QR não confere para o agendamento {}", id);
            return Err(AppError::QrMismatch);
        }

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(target));
        fields.insert("confirmedBy".into(), json!(session.user_id));
        fields.insert("confirmedAt".into(), timestamp::to_value(now));

        self.apply(appointment, fields, now, AppointmentOutcomeKind::Confirmed, lang).await
    }

    pub async fn cancel(&self, session: &Session, id: &str, lang: &str) -> Result<AppointmentOutcome, AppError> {
        let appointment = self.get(session, id).await?;

        let target = match transition(&appointment.status, AppointmentAction::Cancel)? {
            Transition::Apply(target) => target,
            other => return Ok(self.no_op(appointment, other, lang)),
        };

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(target));
        fields.insert("cancelledBy".into(), json!(session.user_id));
        fields.insert("cancelledAt".into(), timestamp::to_value(now));

        self.apply(appointment, fields, now, AppointmentOutcomeKind::Cancelled, lang).await
    }

    pub async fn reschedule(
        &self,
        session: &Session,
        id: &str,
        scheduled_at: DateTime<Utc>,
        lang: &str,
    ) -> Result<AppointmentOutcome, AppError> {
        let appointment = self.get(session, id).await?;

        let target = match transition(&appointment.status, AppointmentAction::Reschedule)? {
            Transition::Apply(target) => target,
            other => return Ok(self.no_op(appointment, other, lang)),
        };

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(target));
        fields.insert("scheduledAt".into(), timestamp::to_value(scheduled_at));

        self.apply(appointment, fields, now, AppointmentOutcomeKind::Rescheduled, lang).await
    }

    /// QR code (SVG) com o código esperado, para o cliente exibir no balcão.
    pub async fn qr_svg(&self, session: &Session, id: &str) -> Result<String, AppError> {
        let appointment = self.load(id).await?;
        let is_client = appointment.user_id.as_deref() == Some(session.user_id.as_str());
        if !is_client && !session.is_admin {
            return Err(AppError::AccessDenied);
        }

        let content = appointment
            .code_data
            .qr_content
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::DataIntegrity(format!("agendamento {} sem codeData.qrContent", id)))?;

        let code = QrCode::new(content.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .quiet_zone(true)
            .build())
    }

    async fn load(&self, id: &str) -> Result<Appointment, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("agendamento {}", id)))
    }

    /// Escrita principal e, em seguida, as companhias: espelho do parceiro
    /// (pode não existir) e a entrada em `appointments[]` do ticket.
    async fn apply(
        &self,
        mut appointment: Appointment,
        mut fields: Fields,
        now: DateTime<Utc>,
        outcome: AppointmentOutcomeKind,
        lang: &str,
    ) -> Result<AppointmentOutcome, AppError> {
        let mirror_fields = fields.clone();
        fields.insert("updatedAt".into(), timestamp::to_value(now));
        self.repo.update_fields(&appointment.id, fields.clone()).await?;

        // O documento local reflete o que foi gravado.
        let mut merged = serde_json::to_value(&appointment)?;
        if let Some(map) = merged.as_object_mut() {
            map.extend(fields);
        }
        let code_data = std::mem::take(&mut appointment.code_data);
        appointment = serde_json::from_value(merged)?;
        appointment.code_data = code_data;

        let mut steps = vec![CompanionWrite::Update {
            collection: collections::partner_reservations(&appointment.partner_id),
            id: appointment.id.clone(),
            fields: mirror_fields,
            tolerate_missing: true,
        }];
        if let Some(ticket_id) = &appointment.ticket_id {
            let mut entry = Fields::new();
            entry.insert("status".into(), json!(appointment.status));
            steps.push(CompanionWrite::PatchArrayEntry {
                collection: collections::TICKETS.to_string(),
                id: ticket_id.clone(),
                array_field: "appointments".into(),
                match_key: "appointmentId".into(),
                match_value: json!(appointment.id),
                fields: entry,
            });
        }

        let kind = format!("appointment.{}", appointment.status);
        let report = self.intent_log.run(&kind, steps).await;
        tracing::info!("📅 Agendamento {} -> {}", appointment.id, appointment.status);

        Ok(AppointmentOutcome {
            outcome,
            message: self.i18n.translate(lang, outcome_key(outcome)),
            badge: appointment.status.badge(lang, &self.i18n),
            pending_intent: (!report.completed).then_some(report.intent_id),
            appointment,
        })
    }

    fn no_op(&self, appointment: Appointment, result: Transition, lang: &str) -> AppointmentOutcome {
        let outcome = match result {
            Transition::AlreadyCancelled => AppointmentOutcomeKind::AlreadyCancelled,
            _ => AppointmentOutcomeKind::AlreadyConfirmed,
        };
        AppointmentOutcome {
            outcome,
            message: self.i18n.translate(lang, outcome_key(outcome)),
            badge: appointment.status.badge(lang, &self.i18n),
            pending_intent: None,
            appointment,
        }
    }
}

fn outcome_key(outcome: AppointmentOutcomeKind) -> &'static str {
    match outcome {
        AppointmentOutcomeKind::Confirmed => "outcome.appointment.confirmed",
        AppointmentOutcomeKind::Cancelled => "outcome.appointment.cancelled",
        AppointmentOutcomeKind::Rescheduled => "outcome.appointment.rescheduled",
        AppointmentOutcomeKind::AlreadyConfirmed => "outcome.appointment.already_confirmed",
        AppointmentOutcomeKind::AlreadyCancelled => "outcome.appointment.already_cancelled",
    }
}

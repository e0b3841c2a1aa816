// src/handlers/appointments.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::DateTime;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::appointment::{Appointment, AppointmentOutcome},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListParams {
    /// Só para admins; parceiros sempre veem os próprios.
    pub partner_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    #[schema(example = "RDV-8F3A2C")]
    pub scanned: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    // Milissegundos desde a época.
    #[schema(example = 1767225600000_i64)]
    pub scheduled_at: i64,
}

// GET /api/appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "Appointments",
    params(AppointmentListParams),
    responses(
        (status = 200, description = "Agendamentos do parceiro, por data", body = Vec<Appointment>),
        (status = 403, description = "Conta sem vínculo com parceiro")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Query(params): Query<AppointmentListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = app_state
        .appointment_service
        .list(&session, params.partner_id.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointments)))
}

// GET /api/appointments/{id}
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento", body = Appointment),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .get(&session, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// POST /api/appointments/{id}/confirm
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/confirm",
    tag = "Appointments",
    request_body = ScanPayload,
    params(("id" = String, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Confirmado, ou já finalizado (resultado informativo)", body = AppointmentOutcome),
        (status = 409, description = "Agendamento sem código esperado"),
        (status = 422, description = "O código escaneado não confere")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<ScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .appointment_service
        .confirm_by_scan(&session, &id, &payload.scanned, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/appointments/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    tag = "Appointments",
    params(("id" = String, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Cancelado, ou já finalizado (resultado informativo)", body = AppointmentOutcome)
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .appointment_service
        .cancel(&session, &id, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/appointments/{id}/reschedule
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/reschedule",
    tag = "Appointments",
    request_body = ReschedulePayload,
    params(("id" = String, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Nova data gravada", body = AppointmentOutcome),
        (status = 400, description = "Data inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let scheduled_at = DateTime::from_timestamp_millis(payload.scheduled_at).ok_or_else(|| {
        AppError::InvalidInput(format!("scheduledAt inválido: {}", payload.scheduled_at))
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let outcome = app_state
        .appointment_service
        .reschedule(&session, &id, scheduled_at, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// GET /api/appointments/{id}/qr
#[utoipa::path(
    get,
    path = "/api/appointments/{id}/qr",
    tag = "Appointments",
    params(("id" = String, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "QR code do agendamento", content_type = "image/svg+xml", body = String),
        (status = 403, description = "Apenas o cliente do agendamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn appointment_qr(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let svg = app_state
        .appointment_service
        .qr_svg(&session, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

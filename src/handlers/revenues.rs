// src/handlers/revenues.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::finance::{Payment, RevenueSummary},
    services::finance_service::RecordPaymentPayload,
};

// POST /api/revenues
#[utoipa::path(
    post,
    path = "/api/revenues",
    tag = "Revenues",
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, description = "Receita lançada", body = Payment),
        (status = 400, description = "Valor deve ser positivo"),
        (status = 404, description = "Parceiro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = app_state
        .finance_service
        .record_payment(&session, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/partners/{partner_id}/revenues
#[utoipa::path(
    get,
    path = "/api/partners/{partner_id}/revenues",
    tag = "Revenues",
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Lançamentos, mais recentes primeiro", body = Vec<Payment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_revenues(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(partner_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .finance_service
        .list(&session, &partner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payments)))
}

// GET /api/partners/{partner_id}/revenues/summary
#[utoipa::path(
    get,
    path = "/api/partners/{partner_id}/revenues/summary",
    tag = "Revenues",
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Total e quantidade de lançamentos", body = RevenueSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn revenue_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(partner_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .finance_service
        .summary(&session, &partner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/partners/{partner_id}/revenues/statement.pdf
#[utoipa::path(
    get,
    path = "/api/partners/{partner_id}/revenues/statement.pdf",
    tag = "Revenues",
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Extrato em PDF", content_type = "application/pdf", body = Vec<u8>)
    ),
    security(("api_jwt" = []))
)]
pub async fn revenue_statement(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(partner_id): Path<String>,
) -> Result<Response, ApiError> {
    let (partner, payments, summary) = app_state
        .finance_service
        .statement(&session, &partner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .revenue_statement_pdf(&partner, &payments, &summary, Utc::now(), locale.as_str())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"extrato_{}.pdf\"", partner.id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}

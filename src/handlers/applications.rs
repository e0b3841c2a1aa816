// src/handlers/applications.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::application::{
        ApplicantInfo, ApplicationListItem, ApplicationStatus, ApplicationStatusReport,
        BusinessInfo, PartnerApplication,
    },
    services::projection::NameSearch,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationPayload {
    #[validate(nested)]
    pub applicant_info: ApplicantInfo,

    #[validate(nested)]
    pub business_info: BusinessInfo,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateApplicationStatusPayload {
    #[schema(value_type = String, example = "accepted")]
    pub status: ApplicationStatus,
}

// POST /api/applications  (público: formulário "devenir partenaire")
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Candidatura recebida", body = PartnerApplication),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn submit_application(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let application = app_state
        .application_service
        .submit(&payload.applicant_info, &payload.business_info)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(application)))
}

// GET /api/admin/applications
#[utoipa::path(
    get,
    path = "/api/admin/applications",
    tag = "Applications",
    params(
        ("search" = Option<String>, Query, description = "Busca por nome ou e-mail"),
        ("order" = Option<String>, Query, description = "asc | desc (por nome)"),
        ("status" = Option<String>, Query, description = "Filtra por status")
    ),
    responses(
        (status = 200, description = "Candidaturas", body = Vec<ApplicationListItem>),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_applications(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Query(params): Query<NameSearch>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .application_service
        .list(&session, &params, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(items)))
}

// GET /api/admin/applications/{id}
#[utoipa::path(
    get,
    path = "/api/admin/applications/{id}",
    tag = "Applications",
    params(("id" = String, Path, description = "ID da candidatura")),
    responses(
        (status = 200, description = "Candidatura", body = PartnerApplication),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_application(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let application = app_state
        .application_service
        .get(&session, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(application)))
}

// PUT /api/admin/applications/{id}/status
#[utoipa::path(
    put,
    path = "/api/admin/applications/{id}/status",
    tag = "Applications",
    request_body = UpdateApplicationStatusPayload,
    params(("id" = String, Path, description = "ID da candidatura")),
    responses(
        (status = 200, description = "Status gravado; aceite/recusa trazem o link mailto:", body = ApplicationStatusReport),
        (status = 403, description = "Apenas admins"),
        (status = 409, description = "Status desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_application_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .application_service
        .update_status(&session, &id, payload.status, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

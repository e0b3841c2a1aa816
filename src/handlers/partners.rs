// src/handlers/partners.rs

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::partner::Partner,
    services::{profile_service::ImageUpload, storage_service::content_type_for},
};

// GET /api/partners
#[utoipa::path(
    get,
    path = "/api/partners",
    tag = "Partners",
    responses(
        (status = 200, description = "Parceiros em ordem alfabética", body = Vec<Partner>),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_partners(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let partners = app_state
        .profile_service
        .list_partners(&session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(partners)))
}

// GET /api/partners/{partner_id}
#[utoipa::path(
    get,
    path = "/api/partners/{partner_id}",
    tag = "Partners",
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Dados públicos do parceiro", body = Partner),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_partner(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(partner_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let partner = app_state
        .profile_service
        .get_partner(&partner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(partner)))
}

// PUT /api/partners/{partner_id}/logo  (corpo = bytes da imagem)
#[utoipa::path(
    put,
    path = "/api/partners/{partner_id}/logo",
    tag = "Partners",
    request_body(content = Vec<u8>, content_type = "image/*", description = "Bytes da imagem"),
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Logo atualizado", body = Partner),
        (status = 400, description = "Arquivo vazio ou não é imagem"),
        (status = 403, description = "Parceiro diferente")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_logo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(partner_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let partner = app_state
        .profile_service
        .upload_logo(&session, &partner_id, ImageUpload { bytes: &body, content_type })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(partner)))
}

// GET /files/{*path}  (público: URLs devolvidas por `public_url`)
pub async fn serve_file(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = app_state
        .storage
        .get(&path)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::ResourceNotFound(path.clone())))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response())
}

// src/handlers/admin.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::auth::{UpdateClaimsPayload, UserAccount},
    services::{intent_log::ResumeSummary, projection::SortOrder},
};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub search: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserListParams),
    responses(
        (status = 200, description = "Usuários, filtrados por nome/e-mail", body = Vec<UserAccount>),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .auth_service
        .list_users(&session, params.search.as_deref(), params.order)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(users)))
}

// PUT /api/admin/users/{id}/claims
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/claims",
    tag = "Admin",
    request_body = UpdateClaimsPayload,
    params(("id" = String, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Claims atualizados (valem no próximo refresh)", body = UserAccount),
        (status = 403, description = "Apenas admins, ou papel de parceiro sem vínculo"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_claims(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateClaimsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .auth_service
        .set_claims(&session, &user_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// POST /api/admin/intents/resume
#[utoipa::path(
    post,
    path = "/api/admin/intents/resume",
    tag = "Admin",
    responses(
        (status = 200, description = "Escritas de companhia pendentes reexecutadas", body = ResumeSummary),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn resume_intents(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .intent_log
        .resume_pending()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

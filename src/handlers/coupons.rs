// src/handlers/coupons.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::coupon::{CouponView, RedeemOutcome},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CouponScanPayload {
    #[schema(example = "CPN-7QX2")]
    pub scanned: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteCouponPayload {
    #[serde(default)]
    pub confirm: bool,
}

// POST /api/coupons/lookup
#[utoipa::path(
    post,
    path = "/api/coupons/lookup",
    tag = "Coupons",
    request_body = CouponScanPayload,
    responses(
        (status = 200, description = "Prévia do cupom escaneado", body = CouponView),
        (status = 404, description = "Cupom inválido"),
        (status = 409, description = "Mais de um cupom com o mesmo código")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<CouponScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .coupon_service
        .lookup(&session, &payload.scanned, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// POST /api/coupons/redeem
#[utoipa::path(
    post,
    path = "/api/coupons/redeem",
    tag = "Coupons",
    request_body = CouponScanPayload,
    responses(
        (status = 200, description = "Resgatado, ou já usado (sem escrita)", body = RedeemOutcome),
        (status = 404, description = "Cupom inválido"),
        (status = 409, description = "Mais de um cupom com o mesmo código")
    ),
    security(("api_jwt" = []))
)]
pub async fn redeem_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<CouponScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .coupon_service
        .redeem(&session, &payload.scanned, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// DELETE /api/coupons/{id}
#[utoipa::path(
    delete,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    request_body = DeleteCouponPayload,
    params(("id" = String, Path, description = "ID do cupom")),
    responses(
        (status = 204, description = "Cupom apagado definitivamente"),
        (status = 400, description = "Falta `confirm: true`"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_coupon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<String>,
    Json(payload): Json<DeleteCouponPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .coupon_service
        .delete(&session, &id, payload.confirm)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users/{id}/coupons
#[utoipa::path(
    get,
    path = "/api/users/{id}/coupons",
    tag = "Coupons",
    params(("id" = String, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Cupons do usuário, mais recentes primeiro", body = Vec<CouponView>),
        (status = 403, description = "Cupons de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_user_coupons(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let coupons = app_state
        .coupon_service
        .list_for_user(&session, &user_id, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(coupons)))
}

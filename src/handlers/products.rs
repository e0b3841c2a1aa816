// src/handlers/products.rs

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
        rbac::{AdminOnly, PartnerOnly, RequireRole},
    },
    models::product::{ProductStatus, ProductView},
    services::product_service::CreateProductPayload,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewProductPayload {
    #[schema(value_type = String, example = "approved")]
    pub status: ProductStatus,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado, aguardando revisão", body = ProductView),
        (status = 400, description = "Nome vazio ou preço negativo"),
        (status = 403, description = "Conta sem vínculo com parceiro")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<PartnerOnly>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .create(&session, &payload, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Produtos do parceiro logado", body = Vec<ProductView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_products(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<PartnerOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list_own(&session, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/partners/{partner_id}/products
#[utoipa::path(
    get,
    path = "/api/partners/{partner_id}/products",
    tag = "Products",
    params(("partner_id" = String, Path, description = "ID do parceiro")),
    responses(
        (status = 200, description = "Produtos do parceiro", body = Vec<ProductView>),
        (status = 403, description = "Parceiro diferente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_partner_products(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(partner_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list(&session, &partner_id, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// DELETE /api/partners/{partner_id}/products/{id}
#[utoipa::path(
    delete,
    path = "/api/partners/{partner_id}/products/{id}",
    tag = "Products",
    params(
        ("partner_id" = String, Path, description = "ID do parceiro"),
        ("id" = String, Path, description = "ID do produto")
    ),
    responses(
        (status = 204, description = "Produto apagado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path((partner_id, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .product_service
        .delete(&session, &partner_id, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/partners/{partner_id}/products/{id}/review
#[utoipa::path(
    put,
    path = "/api/partners/{partner_id}/products/{id}/review",
    tag = "Products",
    request_body = ReviewProductPayload,
    params(
        ("partner_id" = String, Path, description = "ID do parceiro"),
        ("id" = String, Path, description = "ID do produto")
    ),
    responses(
        (status = 200, description = "Produto aprovado ou recusado", body = ProductView),
        (status = 409, description = "Status de revisão inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn review_product(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path((partner_id, id)): Path<(String, String)>,
    Json(payload): Json<ReviewProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .review(&session, &partner_id, &id, payload.status, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

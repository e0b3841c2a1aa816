// src/handlers/tickets.rs

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::ticket::{
        BatchDeleteResponse, ConversationMessage, Ticket, TicketListResponse, TicketStatus,
    },
    services::{
        mirror,
        projection::{project_tickets, TicketFilter},
        ticket_service::{snapshot_payload, TicketStatusReport},
    },
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenTicketPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "reservation")]
    pub category: String,

    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Bonjour, je voudrais réserver une table.")]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketStatusPayload {
    #[schema(value_type = String, example = "en-cours")]
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDeletePayload {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostMessagePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub text: String,
}

// ---
// Handlers
// ---

// GET /api/tickets
#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    params(
        ("includeTerminal" = Option<bool>, Query, description = "Inclui conversas finalizadas"),
        ("status" = Option<String>, Query, description = "Filtra por status"),
        ("search" = Option<String>, Query, description = "Busca em mensagem, categoria e participantes"),
        ("sort" = Option<String>, Query, description = "date | name"),
        ("order" = Option<String>, Query, description = "asc | desc")
    ),
    responses(
        (status = 200, description = "Tickets visíveis para a sessão", body = TicketListResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Query(filter): Query<TicketFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .ticket_service
        .list(&session, &filter, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/tickets/stream  (Server-Sent Events)
#[utoipa::path(
    get,
    path = "/api/tickets/stream",
    tag = "Tickets",
    responses(
        (status = 200, description = "Eventos `snapshot` com a lista projetada a cada mudança", content_type = "text/event-stream")
    ),
    security(("api_jwt" = []))
)]
pub async fn stream_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Query(filter): Query<TicketFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let query = app_state.ticket_service.owner_query(&session);
    let subscription = mirror::subscribe::<Ticket>(app_state.store.clone(), query);
    let service = app_state.ticket_service.clone();

    tracing::debug!("📡 Feed de tickets aberto para {}", session.user_id);

    // A assinatura é abortada quando o cliente desconecta e o stream é solto.
    let stream = subscription.into_stream().map(move |snapshot| {
        let payload = snapshot.and_then(|tickets| {
            let response = service.to_list_response(project_tickets(&tickets, &filter), locale.as_str());
            snapshot_payload(&response)
        });

        let event = match payload {
            Ok(value) => Event::default().event("snapshot").data(value.to_string()),
            Err(e) => Event::default()
                .event("error")
                .data(e.to_api_error(&locale, service.i18n()).error),
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// POST /api/tickets
#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "Tickets",
    request_body = OpenTicketPayload,
    responses(
        (status = 201, description = "Ticket aberto com a primeira mensagem", body = Ticket),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<OpenTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .open_ticket(&session, &payload.category, &payload.message)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

// GET /api/tickets/{id}
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Ticket", body = Ticket),
        (status = 403, description = "Ticket de outro usuário"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .ticket_service
        .get(&session, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// PUT /api/tickets/{id}/status
#[utoipa::path(
    put,
    path = "/api/tickets/{id}/status",
    tag = "Tickets",
    request_body = UpdateTicketStatusPayload,
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Status alterado", body = TicketStatusReport),
        (status = 403, description = "Sem permissão"),
        (status = 409, description = "Status desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ticket_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicketStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .ticket_service
        .update_status(&session, &id, payload.status, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// POST /api/tickets/batch-delete
#[utoipa::path(
    post,
    path = "/api/tickets/batch-delete",
    tag = "Tickets",
    request_body = BatchDeletePayload,
    responses(
        (status = 200, description = "Tickets apagados numa única operação", body = BatchDeleteResponse),
        (status = 400, description = "Seleção vazia"),
        (status = 409, description = "Há ticket não finalizado na seleção")
    ),
    security(("api_jwt" = []))
)]
pub async fn batch_delete_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<BatchDeletePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .ticket_service
        .batch_delete(&session, &payload.ids, locale.as_str())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/tickets/{id}/messages
#[utoipa::path(
    get,
    path = "/api/tickets/{id}/messages",
    tag = "Tickets",
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Mensagens da conversa, mais antigas primeiro", body = Vec<ConversationMessage>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = app_state
        .ticket_service
        .list_messages(&session, &id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(messages)))
}

// POST /api/tickets/{id}/messages
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/messages",
    tag = "Tickets",
    request_body = PostMessagePayload,
    params(("id" = String, Path, description = "ID do ticket")),
    responses(
        (status = 201, description = "Mensagem enviada", body = ConversationMessage),
        (status = 409, description = "Conversa finalizada")
    ),
    security(("api_jwt" = []))
)]
pub async fn post_message(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<PostMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .ticket_service
        .post_message(&session, &id, &payload.text)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(message)))
}

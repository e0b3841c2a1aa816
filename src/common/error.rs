// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro único da camada de serviço. Os handlers convertem para ApiError.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    AccessDenied,

    #[error("Conta sem vínculo com parceiro")]
    PartnerLinkMissing,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Transição inválida de '{from}' para '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Cupom inválido")]
    InvalidCoupon,

    #[error("Cupom ambíguo: {0} documentos com o mesmo código")]
    AmbiguousCoupon(usize),

    #[error("O código escaneado não corresponde")]
    QrMismatch,

    #[error("Dado inconsistente: {0}")]
    DataIntegrity(String),

    #[error("Confirmação explícita necessária")]
    ConfirmationRequired,

    #[error("Conversa finalizada")]
    TicketClosed,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de migração: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro de armazenamento: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // `anyhow::Error` guarda o contexto de erros inesperados.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// O corpo de erro que sai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Chave de tradução e status HTTP de cada variante.
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "error.validation"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "error.invalid_input"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "error.email_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "error.invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "error.invalid_token"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "error.user_not_found"),
            AppError::AccessDenied => (StatusCode::FORBIDDEN, "error.access_denied"),
            AppError::PartnerLinkMissing => (StatusCode::FORBIDDEN, "error.partner_link_missing"),
            AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "error.not_found"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "error.invalid_transition"),
            AppError::InvalidCoupon => (StatusCode::NOT_FOUND, "error.invalid_coupon"),
            AppError::AmbiguousCoupon(_) => (StatusCode::CONFLICT, "error.ambiguous_coupon"),
            AppError::QrMismatch => (StatusCode::UNPROCESSABLE_ENTITY, "error.qr_mismatch"),
            AppError::DataIntegrity(_) => (StatusCode::CONFLICT, "error.data_integrity"),
            AppError::ConfirmationRequired => (StatusCode::BAD_REQUEST, "error.confirmation_required"),
            AppError::TicketClosed => (StatusCode::CONFLICT, "error.ticket_closed"),
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::SerializationError(_)
            | AppError::StorageError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::FontNotFound(_)
            | AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.internal"),
        }
    }

    /// Converte o erro em resposta HTTP com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();
        let lang = locale.0.as_str();

        let details = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => i18n.translate(lang, m),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidInput(reason) => Some(json!({ "reason": reason })),
            AppError::ResourceNotFound(what) => Some(json!({ "resource": what })),
            AppError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            AppError::AmbiguousCoupon(count) => Some(json!({ "matches": count })),
            AppError::DataIntegrity(reason) => Some(json!({ "reason": reason })),
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` guarda a mensagem detalhada; o cliente só vê a genérica.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        ApiError {
            status,
            error: i18n.translate(lang, key),
            details,
        }
    }
}

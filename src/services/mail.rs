// src/services/mail.rs

//! Intenção de e-mail: um link `mailto:` pré-preenchido entregue a um
//! compositor externo. Não há envio nem rastreio de entrega.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailtoUri {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailtoUri {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// `mailto:{to}?subject=...&body=...` com assunto e corpo percent-encoded.
    pub fn to_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.to.trim(),
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("nenhum aplicativo de e-mail disponível")]
    Unavailable,
}

pub trait MailComposer: Send + Sync {
    fn compose(&self, mail: &MailtoUri) -> Result<(), MailError>;
}

pub type SharedMailComposer = Arc<dyn MailComposer>;

/// Registra o link no log. Padrão em servidor.
pub struct LogMailComposer;

impl MailComposer for LogMailComposer {
    fn compose(&self, mail: &MailtoUri) -> Result<(), MailError> {
        tracing::info!("✉️ E-mail preparado para {}: {}", mail.to, mail.subject);
        tracing::debug!("{}", mail.to_uri());
        Ok(())
    }
}

pub struct DisabledMailComposer;

impl MailComposer for DisabledMailComposer {
    fn compose(&self, _mail: &MailtoUri) -> Result<(), MailError> {
        Err(MailError::Unavailable)
    }
}

pub fn composer_from_name(name: &str) -> SharedMailComposer {
    match name {
        "disabled" => Arc::new(DisabledMailComposer),
        _ => Arc::new(LogMailComposer),
    }
}

// src/models/ticket.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::timestamp,
    models::{appointment::AppointmentStatus, status::{status_taxonomy, StatusBadge}},
};

status_taxonomy! {
    /// Status de um ticket/conversa de suporte.
    pub enum TicketStatus: "ticket" {
        Nouveau => "nouveau", "#2196F3", "fiber-new";
        EnCours => "en-cours", "#FF9800", "autorenew";
        JeyHandling => "jey-handling", "#9C27B0", "smart-toy";
        EscalatedToAgent => "escalated_to_agent", "#F44336", "support-agent";
        Termine => "terminé", "#4CAF50", "check-circle";
        Resolu => "résolu", "#388E3C", "task-alt";
        InProgress => "in-progress", "#FFA726", "pending";
        Terminated => "terminated", "#757575", "cancel";
    }
}

impl TicketStatus {
    /// Depois destes, nenhuma transição é esperada: o ticket sai das
    /// listas ativas e pode ser apagado.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Termine | Self::Terminated | Self::Resolu)
    }
}

// Entrada embutida no ticket que espelha o status de um agendamento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRef {
    pub appointment_id: String,
    #[serde(default)]
    #[schema(value_type = String, example = "scheduled")]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[schema(example = "3f1c2a9e-6c55-4a8e-9a43-1f0b7e2d8c11")]
    pub id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,

    #[serde(default)]
    #[schema(value_type = String, example = "nouveau")]
    pub status: TicketStatus,

    // Milissegundos; ausente vira a época.
    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64, example = 1717171717000i64)]
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    #[schema(example = "Bonjour, ma commande n'est pas arrivée")]
    pub message: String,

    #[serde(default)]
    #[schema(example = "livraison")]
    pub category: String,

    #[serde(default)]
    pub participant_names: Vec<String>,

    #[serde(default)]
    pub appointments: Vec<AppointmentRef>,
}

impl Ticket {
    /// Nome usado na ordenação alfabética e na busca.
    pub fn display_name(&self) -> String {
        self.participant_names.join(", ")
    }
}

// Mensagem de uma conversa (coleção `conversations`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    pub ticket_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    pub text: String,
    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketListItem {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub badge: StatusBadge,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketListResponse {
    pub items: Vec<TicketListItem>,
    pub total: usize,
    // A tela mostra a imagem de "nenhuma conversa" quando true.
    pub is_empty: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteResponse {
    pub deleted: Vec<String>,
    pub remaining: TicketListResponse,
}

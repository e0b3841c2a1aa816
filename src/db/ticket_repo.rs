// src/db/ticket_repo.rs

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{get_as, Direction, Fields, Query, SharedStore},
    },
    models::ticket::{ConversationMessage, Ticket, TicketStatus},
    services::mirror::fetch_snapshot,
};

#[derive(Clone)]
pub struct TicketRepository {
    store: SharedStore,
}

impl TicketRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // =========================================================================
    //  TICKETS
    // =========================================================================

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, AppError> {
        get_as(&self.store, collections::TICKETS, id).await
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<Ticket>, AppError> {
        fetch_snapshot(&self.store, query).await
    }

    pub async fn create_ticket(
        &self,
        user_id: &str,
        participant_name: &str,
        category: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Ticket, AppError> {
        let data = json!({
            "userId": user_id,
            "status": TicketStatus::Nouveau,
            "lastUpdated": timestamp::to_value(now),
            "message": message,
            "category": category,
            "participantNames": [participant_name],
            "appointments": [],
        });
        let doc = self.store.create(collections::TICKETS, data).await?;
        doc.decode()
    }

    /// Escrita principal da transição: status + `lastUpdated`.
    pub async fn update_status(
        &self,
        id: &str,
        status: &TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(status));
        fields.insert("lastUpdated".into(), timestamp::to_value(now));
        self.store.update(collections::TICKETS, id, fields).await
    }

    pub async fn touch_preview(&self, id: &str, message: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut fields = Fields::new();
        fields.insert("message".into(), json!(message));
        fields.insert("lastUpdated".into(), timestamp::to_value(now));
        self.store.update(collections::TICKETS, id, fields).await
    }

    pub async fn batch_delete(&self, ids: &[String]) -> Result<(), AppError> {
        self.store.batch_delete(collections::TICKETS, ids).await
    }

    // =========================================================================
    //  MENSAGENS
    // =========================================================================

    pub async fn list_messages(&self, ticket_id: &str) -> Result<Vec<ConversationMessage>, AppError> {
        let query = Query::collection(collections::CONVERSATIONS)
            .where_eq("ticketId", ticket_id)
            .order_by("createdAt", Direction::Asc);
        fetch_snapshot(&self.store, &query).await
    }

    pub async fn add_message(
        &self,
        ticket_id: &str,
        sender_id: &str,
        sender_name: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ConversationMessage, AppError> {
        let data = json!({
            "ticketId": ticket_id,
            "senderId": sender_id,
            "senderName": sender_name,
            "text": text,
            "createdAt": timestamp::to_value(now),
        });
        let doc = self.store.create(collections::CONVERSATIONS, data).await?;
        doc.decode()
    }
}

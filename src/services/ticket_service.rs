// src/services/ticket_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, i18n::I18nStore, timestamp},
    db::{
        collections,
        store::{require_object, Direction, Query},
        TicketRepository, UserRepository,
    },
    models::{
        auth::{Role, Session},
        intent::CompanionWrite,
        status::{StatusBadge, StatusTaxonomy},
        ticket::{
            BatchDeleteResponse, ConversationMessage, Ticket, TicketListItem, TicketListResponse,
            TicketStatus,
        },
    },
    services::{
        intent_log::{IntentLog, IntentReport},
        mirror::{MirrorCommand, MirrorState},
        projection::{project_tickets, TicketFilter},
    },
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatusReport {
    pub ticket: Ticket,
    pub badge: StatusBadge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion: Option<IntentReport>,
}

#[derive(Clone)]
pub struct TicketService {
    repo: TicketRepository,
    user_repo: UserRepository,
    intent_log: IntentLog,
    i18n: Arc<I18nStore>,
    page_size: usize,
}

impl TicketService {
    pub fn new(
        repo: TicketRepository,
        user_repo: UserRepository,
        intent_log: IntentLog,
        i18n: Arc<I18nStore>,
        page_size: usize,
    ) -> Self {
        Self { repo, user_repo, intent_log, i18n, page_size }
    }

    /// Consulta do espelho de tickets para a sessão: filtrada pelo dono,
    /// mais recentes primeiro, limitada ao tamanho de página.
    pub fn owner_query(&self, session: &Session) -> Query {
        let query = Query::collection(collections::TICKETS)
            .order_by("lastUpdated", Direction::Desc)
            .limit(self.page_size);

        if session.is_staff() {
            return query;
        }
        match (session.role, session.partner_id.as_deref()) {
            (Role::Partner, Some(partner_id)) => query.where_eq("partnerId", partner_id),
            _ => query.where_eq("userId", session.user_id.as_str()),
        }
    }

    pub fn to_list_response(&self, tickets: Vec<Ticket>, lang: &str) -> TicketListResponse {
        let items: Vec<TicketListItem> = tickets
            .into_iter()
            .map(|ticket| {
                let badge = ticket.status.badge(lang, &self.i18n);
                TicketListItem { ticket, badge }
            })
            .collect();

        TicketListResponse {
            total: items.len(),
            is_empty: items.is_empty(),
            items,
        }
    }

    pub async fn list(
        &self,
        session: &Session,
        filter: &TicketFilter,
        lang: &str,
    ) -> Result<TicketListResponse, AppError> {
        let raw = self.repo.list(&self.owner_query(session)).await?;
        Ok(self.to_list_response(project_tickets(&raw, filter), lang))
    }

    pub async fn open_ticket(
        &self,
        session: &Session,
        category: &str,
        message: &str,
    ) -> Result<Ticket, AppError> {
        let name = self.sender_name(session).await?;
        let now = Utc::now();
        let ticket = self
            .repo
            .create_ticket(&session.user_id, &name, category.trim(), message.trim(), now)
            .await?;
        self.repo
            .add_message(&ticket.id, &session.user_id, &name, message.trim(), now)
            .await?;
        Ok(ticket)
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<Ticket, AppError> {
        let ticket = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("ticket {}", id)))?;

        if can_view(session, &ticket) {
            Ok(ticket)
        } else {
            Err(AppError::AccessDenied)
        }
    }

    /// Troca o status. Passar para um status final copia o ticket para
    /// `terminatedTickets` como escrita de companhia.
    pub async fn update_status(
        &self,
        session: &Session,
        id: &str,
        status: TicketStatus,
        lang: &str,
    ) -> Result<TicketStatusReport, AppError> {
        let mut ticket = self.get(session, id).await?;
        if !session.is_staff() && session.role != Role::Partner {
            return Err(AppError::AccessDenied);
        }
        if !status.is_known() {
            return Err(AppError::InvalidTransition {
                from: ticket.status.to_string(),
                to: status.to_string(),
            });
        }

        let now = Utc::now();
        self.repo.update_status(id, &status, now).await?;

        let becomes_terminal = status.is_terminal() && !ticket.status.is_terminal();
        ticket.status = status;
        ticket.last_updated = now;
        tracing::info!("🎫 Ticket {} -> {} por {}", id, ticket.status, session.user_id);

        let companion = if becomes_terminal {
            let mut fields = require_object(serde_json::to_value(&ticket)?)?;
            fields.remove("id");
            fields.insert("ticketId".into(), json!(ticket.id));
            fields.insert("terminatedBy".into(), json!(session.user_id));
            fields.insert("terminatedAt".into(), timestamp::to_value(now));

            let steps = vec![CompanionWrite::Merge {
                collection: collections::TERMINATED_TICKETS.to_string(),
                id: ticket.id.clone(),
                fields,
            }];
            Some(self.intent_log.run("ticket.terminated", steps).await)
        } else {
            None
        };

        Ok(TicketStatusReport {
            badge: ticket.status.badge(lang, &self.i18n),
            ticket,
            companion,
        })
    }

    /// Apaga vários tickets finalizados numa única operação atômica.
    pub async fn batch_delete(
        &self,
        session: &Session,
        ids: &[String],
        lang: &str,
    ) -> Result<BatchDeleteResponse, AppError> {
        let mut selected: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !selected.contains(id) {
                selected.push(id.clone());
            }
        }
        if selected.is_empty() {
            return Err(AppError::InvalidInput("nenhum ticket selecionado".into()));
        }

        for id in &selected {
            let ticket = self.get(session, id).await?;
            if !ticket.status.is_terminal() {
                return Err(AppError::InvalidTransition {
                    from: ticket.status.to_string(),
                    to: "deleted".into(),
                });
            }
        }

        let current = self.repo.list(&self.owner_query(session)).await?;
        self.repo.batch_delete(&selected).await?;
        tracing::info!("🗑️ {} tickets apagados por {}", selected.len(), session.user_id);

        let state = MirrorState::new(current).apply_optimistic(MirrorCommand::Remove(selected.clone()));
        let terminal_view = TicketFilter {
            include_terminal: true,
            ..TicketFilter::default()
        };

        Ok(BatchDeleteResponse {
            deleted: selected,
            remaining: self.to_list_response(project_tickets(&state.items, &terminal_view), lang),
        })
    }

    pub async fn list_messages(&self, session: &Session, ticket_id: &str) -> Result<Vec<ConversationMessage>, AppError> {
        self.get(session, ticket_id).await?;
        self.repo.list_messages(ticket_id).await
    }

    pub async fn post_message(
        &self,
        session: &Session,
        ticket_id: &str,
        text: &str,
    ) -> Result<ConversationMessage, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("mensagem vazia".into()));
        }

        let ticket = self.get(session, ticket_id).await?;
        if ticket.status.is_terminal() {
            return Err(AppError::TicketClosed);
        }

        let name = self.sender_name(session).await?;
        let now = Utc::now();
        let message = self
            .repo
            .add_message(ticket_id, &session.user_id, &name, text, now)
            .await?;

        // A prévia do ticket é secundária: a mensagem já foi gravada.
        if let Err(e) = self.repo.touch_preview(ticket_id, text, now).await {
            tracing::warn!("⚠️ Prévia do ticket {} não atualizada: {}", ticket_id, e);
        }
        Ok(message)
    }

    async fn sender_name(&self, session: &Session) -> Result<String, AppError> {
        let name = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .map(|user| user.display_name)
            .filter(|name| !name.is_empty());
        Ok(name.unwrap_or_else(|| session.email.clone()))
    }

    pub fn i18n(&self) -> &I18nStore {
        &self.i18n
    }
}

fn can_view(session: &Session, ticket: &Ticket) -> bool {
    if session.is_staff() || ticket.user_id == session.user_id {
        return true;
    }
    match (&ticket.partner_id, &session.partner_id) {
        (Some(owner), Some(mine)) => owner == mine,
        _ => false,
    }
}

// Usado pelo feed SSE: valor JSON pronto de um snapshot projetado.
pub fn snapshot_payload(response: &TicketListResponse) -> Result<Value, AppError> {
    Ok(serde_json::to_value(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{
            memory_store::{MemoryDocumentStore, WriteOp},
            store::DocumentStore,
        },
        test_support::{agent, customer, i18n, memory_store, partner, seed},
    };
    use assert_matches::assert_matches;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryDocumentStore>, TicketService) {
        let (store, shared) = memory_store();
        let service = TicketService::new(
            TicketRepository::new(shared.clone()),
            UserRepository::new(shared.clone()),
            IntentLog::new(shared),
            i18n(),
            50,
        );

        for (id, user, partner_id, status, at) in [
            ("t1", "u1", "p1", "nouveau", 100),
            ("t2", "u1", "p1", "terminé", 200),
            ("t3", "u2", "p2", "jey-handling", 300),
            ("t4", "u1", "p1", "résolu", 400),
            ("t5", "u1", "p1", "en-cours", 500),
        ] {
            seed(
                &store,
                "tickets",
                id,
                json!({
                    "userId": user,
                    "partnerId": partner_id,
                    "status": status,
                    "lastUpdated": at,
                    "message": format!("message {}", id),
                    "participantNames": [user],
                }),
            )
            .await;
        }
        (store, service)
    }

    fn ids(response: &TicketListResponse) -> Vec<&str> {
        response.items.iter().map(|item| item.ticket.id.as_str()).collect()
    }

    #[tokio::test]
    async fn list_is_owner_scoped_recent_first_and_hides_terminal() {
        let (_, service) = setup().await;

        let mine = service.list(&customer("u1"), &TicketFilter::default(), "fr").await.unwrap();
        assert_eq!(ids(&mine), vec!["t5", "t1"]);
        assert_eq!(mine.items[0].badge.label, "En cours");

        let staff = service.list(&agent("a1"), &TicketFilter::default(), "fr").await.unwrap();
        assert_eq!(ids(&staff), vec!["t5", "t3", "t1"]);

        let shop = service.list(&partner("pu", "p2"), &TicketFilter::default(), "fr").await.unwrap();
        assert_eq!(ids(&shop), vec!["t3"]);

        let nobody = service.list(&customer("u9"), &TicketFilter::default(), "fr").await.unwrap();
        assert!(nobody.is_empty);
    }

    #[tokio::test]
    async fn page_size_caps_the_owner_query() {
        let (_, service) = setup().await;
        let service = TicketService { page_size: 2, ..service };
        let all = TicketFilter { include_terminal: true, ..TicketFilter::default() };

        let page = service.list(&customer("u1"), &all, "en").await.unwrap();

        assert_eq!(ids(&page), vec!["t5", "t4"]);
    }

    #[tokio::test]
    async fn terminal_transition_writes_the_companion_copy() {
        let (store, service) = setup().await;

        let report = service
            .update_status(&agent("a1"), "t1", TicketStatus::Termine, "en")
            .await
            .unwrap();

        assert_eq!(report.ticket.status, TicketStatus::Termine);
        assert!(report.companion.unwrap().completed);
        let primary = store.get("tickets", "t1").await.unwrap().unwrap();
        assert_eq!(primary.data["status"], "terminé");
        assert!(primary.data["lastUpdated"].as_i64().unwrap() > 100);
        let copy = store.get("terminatedTickets", "t1").await.unwrap().unwrap();
        assert_eq!(copy.data["terminatedBy"], "a1");
        assert_eq!(copy.data["userId"], "u1");
    }

    #[tokio::test]
    async fn companion_failure_never_fails_the_primary_write() {
        let (store, service) = setup().await;
        store.fail_writes_on("terminatedTickets");

        let report = service
            .update_status(&agent("a1"), "t5", TicketStatus::Terminated, "en")
            .await
            .unwrap();

        assert!(!report.companion.unwrap().completed);
        let primary = store.get("tickets", "t5").await.unwrap().unwrap();
        assert_eq!(primary.data["status"], "terminated");
    }

    #[tokio::test]
    async fn unknown_status_and_customers_are_rejected() {
        let (_, service) = setup().await;

        assert_matches!(
            service.update_status(&agent("a1"), "t1", TicketStatus::from("archived"), "en").await,
            Err(AppError::InvalidTransition { .. })
        );
        assert_matches!(
            service.update_status(&customer("u1"), "t1", TicketStatus::Termine, "en").await,
            Err(AppError::AccessDenied)
        );
        assert_matches!(
            service.update_status(&customer("u2"), "t1", TicketStatus::Termine, "en").await,
            Err(AppError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn batch_delete_is_one_operation_and_shrinks_the_list() {
        let (store, service) = setup().await;
        store.clear_write_log();
        let selection = vec!["t2".to_string(), "t4".to_string(), "t2".to_string()];

        let response = service.batch_delete(&customer("u1"), &selection, "en").await.unwrap();

        assert_eq!(response.deleted, vec!["t2", "t4"]);
        assert_eq!(ids(&response.remaining), vec!["t5", "t1"]);
        assert_eq!(
            store.write_log(),
            vec![WriteOp::BatchDelete {
                collection: "tickets".into(),
                ids: vec!["t2".into(), "t4".into()]
            }]
        );
    }

    #[tokio::test]
    async fn deleting_three_selected_tickets_shrinks_the_list_by_three() {
        let (store, service) = setup().await;
        seed(
            &store,
            "tickets",
            "t6",
            json!({ "userId": "u1", "partnerId": "p1", "status": "terminated", "lastUpdated": 600 }),
        )
        .await;
        let everything = TicketFilter {
            include_terminal: true,
            ..TicketFilter::default()
        };
        let before = service.list(&customer("u1"), &everything, "en").await.unwrap().total;
        store.clear_write_log();
        let selection = vec!["t2".to_string(), "t4".to_string(), "t6".to_string()];

        let response = service.batch_delete(&customer("u1"), &selection, "en").await.unwrap();

        assert_eq!(
            store.write_log(),
            vec![WriteOp::BatchDelete {
                collection: "tickets".into(),
                ids: vec!["t2".into(), "t4".into(), "t6".into()]
            }]
        );
        assert_eq!(response.remaining.total, before - 3);
        assert_eq!(ids(&response.remaining), vec!["t5", "t1"]);
    }

    #[tokio::test]
    async fn batch_delete_rejects_empty_or_active_selections() {
        let (store, service) = setup().await;

        assert_matches!(
            service.batch_delete(&customer("u1"), &[], "en").await,
            Err(AppError::InvalidInput(_))
        );
        assert_matches!(
            service.batch_delete(&customer("u1"), &["t2".into(), "t1".into()], "en").await,
            Err(AppError::InvalidTransition { .. })
        );
        assert_eq!(store.count("tickets"), 5);
    }

    #[tokio::test]
    async fn failed_batch_delete_keeps_every_ticket() {
        let (store, service) = setup().await;
        store.fail_writes_on("tickets");

        let result = service.batch_delete(&customer("u1"), &["t2".into(), "t4".into()], "en").await;

        assert_matches!(result, Err(AppError::StorageError(_)));
        assert_eq!(store.count("tickets"), 5);
    }

    #[tokio::test]
    async fn messages_update_the_preview_and_closed_tickets_refuse_them() {
        let (store, service) = setup().await;

        let message = service.post_message(&customer("u1"), "t1", "  Toujours rien  ").await.unwrap();
        assert_eq!(message.text, "Toujours rien");
        assert_eq!(message.sender_name, "u1@example.com");
        let ticket = store.get("tickets", "t1").await.unwrap().unwrap();
        assert_eq!(ticket.data["message"], "Toujours rien");

        let thread = service.list_messages(&customer("u1"), "t1").await.unwrap();
        assert_eq!(thread.len(), 1);

        assert_matches!(
            service.post_message(&customer("u1"), "t2", "allô ?").await,
            Err(AppError::TicketClosed)
        );
        assert_matches!(
            service.list_messages(&customer("u2"), "t1").await,
            Err(AppError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn opening_a_ticket_starts_the_conversation() {
        let (store, service) = setup().await;

        let ticket = service.open_ticket(&customer("u7"), "livraison", "Colis perdu").await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Nouveau);
        assert_eq!(ticket.user_id, "u7");
        assert_eq!(store.count("conversations"), 1);
    }
}

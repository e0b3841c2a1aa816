// src/services/projection.rs

//! Projeção de listas: filtro + ordenação sobre o snapshot atual.
//! Funções puras; nada aqui toca o store.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{
    application::{ApplicationStatus, PartnerApplication},
    auth::UserAccount,
    ticket::{Ticket, TicketStatus},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// `project(raw, filter, sort) -> display`. A ordenação é estável.
pub fn project<T, F, C>(raw: &[T], filter: F, sort: Option<C>) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
    C: Fn(&T, &T) -> Ordering,
{
    let mut display: Vec<T> = raw.iter().filter(|item| filter(item)).cloned().collect();
    if let Some(compare) = sort {
        display.sort_by(|a, b| compare(a, b));
    }
    display
}

/// Busca por substring, sem diferenciar maiúsculas. Busca vazia aceita tudo.
pub fn matches_search(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|field| field.to_lowercase().contains(&needle))
}

pub fn compare_names(a: &str, b: &str, order: SortOrder) -> Ordering {
    order.apply(a.to_lowercase().cmp(&b.to_lowercase()))
}

pub fn compare_dates(a: DateTime<Utc>, b: DateTime<Utc>, order: SortOrder) -> Ordering {
    order.apply(a.cmp(&b))
}

// =============================================================================
//  TICKETS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketSortKey {
    #[default]
    Date,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilter {
    #[serde(default)]
    pub include_terminal: bool,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: TicketSortKey,
    #[serde(default = "default_ticket_order")]
    pub order: SortOrder,
}

fn default_ticket_order() -> SortOrder {
    SortOrder::Desc
}

impl Default for TicketFilter {
    // Visão padrão das conversas: sem finalizados, mais recentes primeiro.
    fn default() -> Self {
        Self {
            include_terminal: false,
            status: None,
            search: None,
            sort: TicketSortKey::Date,
            order: SortOrder::Desc,
        }
    }
}

impl TicketFilter {
    pub fn accepts(&self, ticket: &Ticket) -> bool {
        if !self.include_terminal && ticket.status.is_terminal() {
            return false;
        }
        if let Some(status) = &self.status {
            if &ticket.status != status {
                return false;
            }
        }
        match &self.search {
            Some(query) => {
                let mut fields = vec![ticket.message.as_str(), ticket.category.as_str()];
                fields.extend(ticket.participant_names.iter().map(String::as_str));
                matches_search(query, &fields)
            }
            None => true,
        }
    }

    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        match self.sort {
            TicketSortKey::Date => compare_dates(a.last_updated, b.last_updated, self.order),
            TicketSortKey::Name => compare_names(&a.display_name(), &b.display_name(), self.order),
        }
    }
}

pub fn project_tickets(raw: &[Ticket], filter: &TicketFilter) -> Vec<Ticket> {
    project(raw, |t| filter.accepts(t), Some(|a: &Ticket, b: &Ticket| filter.compare(a, b)))
}

// =============================================================================
//  CANDIDATURAS E USUÁRIOS (busca por nome/e-mail, ordem alfabética)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NameSearch {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Option<ApplicationStatus>,
}

pub fn project_applications(raw: &[PartnerApplication], params: &NameSearch) -> Vec<PartnerApplication> {
    let query = params.search.as_deref().unwrap_or("");
    project(
        raw,
        |a: &PartnerApplication| {
            let status_ok = params.status.as_ref().is_none_or(|s| &a.status == s);
            status_ok
                && matches_search(
                    query,
                    &[
                        &a.applicant_info.name,
                        &a.applicant_info.email,
                        &a.business_info.business_name,
                    ],
                )
        },
        Some(|a: &PartnerApplication, b: &PartnerApplication| {
            compare_names(&a.applicant_info.name, &b.applicant_info.name, params.order)
        }),
    )
}

pub fn project_users(raw: &[UserAccount], search: Option<&str>, order: SortOrder) -> Vec<UserAccount> {
    let query = search.unwrap_or("");
    project(
        raw,
        |u: &UserAccount| matches_search(query, &[&u.display_name, &u.email]),
        Some(|a: &UserAccount, b: &UserAccount| compare_names(&a.display_name, &b.display_name, order)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::timestamp;
    use crate::models::application::{ApplicantInfo, BusinessInfo};

    fn ticket(id: &str, status: &str, at_ms: i64, names: &[&str]) -> Ticket {
        Ticket {
            id: id.into(),
            user_id: "u1".into(),
            partner_id: None,
            status: TicketStatus::from(status),
            last_updated: DateTime::from_timestamp_millis(at_ms).unwrap(),
            message: format!("message {}", id),
            category: "livraison".into(),
            participant_names: names.iter().map(|n| n.to_string()).collect(),
            appointments: vec![],
        }
    }

    fn application(name: &str, email: &str) -> PartnerApplication {
        PartnerApplication {
            id: name.to_lowercase(),
            applicant_info: ApplicantInfo {
                name: name.into(),
                email: email.into(),
                phone: String::new(),
            },
            business_info: BusinessInfo {
                business_name: format!("{} SARL", name),
                category: String::new(),
                address: String::new(),
                description: None,
                website: None,
            },
            status: ApplicationStatus::Pending,
            reviewed_by: None,
            created_at: timestamp::epoch(),
            updated_at: timestamp::epoch(),
        }
    }

    #[test]
    fn default_view_excludes_every_terminal_ticket() {
        let raw = vec![
            ticket("1", "nouveau", 1, &[]),
            ticket("2", "terminé", 2, &[]),
            ticket("3", "terminated", 3, &[]),
            ticket("4", "résolu", 4, &[]),
            ticket("5", "jey-handling", 5, &[]),
            ticket("6", "something-new", 6, &[]),
        ];

        let display = project_tickets(&raw, &TicketFilter::default());

        assert!(display.iter().all(|t| t.status != TicketStatus::Termine));
        assert!(display.iter().all(|t| !t.status.is_terminal()));
        let ids: Vec<&str> = display.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "5", "1"]);
    }

    #[test]
    fn include_terminal_and_status_filter() {
        let raw = vec![ticket("1", "nouveau", 1, &[]), ticket("2", "terminé", 2, &[])];
        let filter = TicketFilter {
            include_terminal: true,
            status: Some(TicketStatus::Termine),
            ..TicketFilter::default()
        };

        let display = project_tickets(&raw, &filter);

        assert_eq!(display.len(), 1);
        assert_eq!(display[0].id, "2");
    }

    #[test]
    fn toggling_sort_twice_matches_a_direct_sort() {
        let raw = vec![
            application("Moussa", "m@x.sn"),
            application("awa", "a@x.sn"),
            application("Zeynab", "z@x.sn"),
            application("Binta", "b@x.sn"),
        ];
        let asc = NameSearch::default();
        let desc = NameSearch {
            order: asc.order.toggle(),
            ..NameSearch::default()
        };

        let sorted_asc = project_applications(&raw, &asc);
        let twice = project_applications(&sorted_asc, &desc);
        let direct = project_applications(&raw, &desc);

        assert_eq!(twice, direct);
        assert_eq!(direct[0].applicant_info.name, "Zeynab");
        assert_eq!(sorted_asc[0].applicant_info.name, "awa");
        assert_eq!(asc.order.toggle().toggle(), asc.order);
    }

    #[test]
    fn search_is_case_insensitive_substring_over_name_and_email() {
        let raw = vec![application("Awa Diallo", "awa@shop.sn"), application("Moussa", "moussa@x.sn")];

        let by_name = NameSearch { search: Some("DIALL".into()), ..NameSearch::default() };
        let by_email = NameSearch { search: Some("@X.SN".into()), ..NameSearch::default() };
        let blank = NameSearch { search: Some("   ".into()), ..NameSearch::default() };

        assert_eq!(project_applications(&raw, &by_name).len(), 1);
        assert_eq!(project_applications(&raw, &by_email)[0].applicant_info.name, "Moussa");
        assert_eq!(project_applications(&raw, &blank).len(), 2);
    }

    #[test]
    fn ticket_search_covers_participants() {
        let raw = vec![ticket("1", "nouveau", 1, &["Fatou Sow"]), ticket("2", "nouveau", 2, &["Ibou"])];
        let filter = TicketFilter {
            search: Some("sow".into()),
            ..TicketFilter::default()
        };

        let display = project_tickets(&raw, &filter);

        assert_eq!(display.len(), 1);
        assert_eq!(display[0].id, "1");
    }
}

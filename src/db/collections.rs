// src/db/collections.rs

// Caminhos das coleções do store.

pub const TICKETS: &str = "tickets";
pub const TERMINATED_TICKETS: &str = "terminatedTickets";
pub const CONVERSATIONS: &str = "conversations";
pub const APPLICATIONS: &str = "applications";
pub const PARTNERS: &str = "partners";
pub const APPOINTMENTS: &str = "appointments";
pub const SURVEY_RESULTS: &str = "surveyResult";
pub const USERS: &str = "users";
pub const PAYMENTS: &str = "payments";
pub const PENDING_WRITES: &str = "pendingWrites";

pub fn partner_products(partner_id: &str) -> String {
    format!("{}/{}/products", PARTNERS, partner_id)
}

pub fn partner_reservations(partner_id: &str) -> String {
    format!("{}/{}/rdv_reservation", PARTNERS, partner_id)
}

// src/db/appointment_repo.rs

use crate::{
    common::error::AppError,
    db::{
        collections,
        store::{get_as, Direction, Fields, Query, SharedStore},
    },
    models::appointment::Appointment,
    services::mirror::fetch_snapshot,
};

#[derive(Clone)]
pub struct AppointmentRepository {
    store: SharedStore,
}

impl AppointmentRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppError> {
        get_as(&self.store, collections::APPOINTMENTS, id).await
    }

    /// `partner_id = None` lista todos (visão do admin).
    pub async fn list(&self, partner_id: Option<&str>, limit: usize) -> Result<Vec<Appointment>, AppError> {
        let mut query = Query::collection(collections::APPOINTMENTS)
            .order_by("scheduledAt", Direction::Asc)
            .limit(limit);
        if let Some(partner_id) = partner_id {
            query = query.where_eq("partnerId", partner_id);
        }
        fetch_snapshot(&self.store, &query).await
    }

    pub async fn update_fields(&self, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store.update(collections::APPOINTMENTS, id, fields).await
    }
}

// src/db/partner_repo.rs

use crate::{
    common::error::AppError,
    db::{
        collections,
        store::{get_as, Fields, Query, SharedStore},
    },
    models::partner::Partner,
    services::mirror::fetch_snapshot,
};

#[derive(Clone)]
pub struct PartnerRepository {
    store: SharedStore,
}

impl PartnerRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Partner>, AppError> {
        get_as(&self.store, collections::PARTNERS, id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Partner>, AppError> {
        fetch_snapshot(&self.store, &Query::collection(collections::PARTNERS)).await
    }

    pub async fn update_fields(&self, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store.update(collections::PARTNERS, id, fields).await
    }
}

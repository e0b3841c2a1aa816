// src/db/application_repo.rs

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{get_as, Direction, Fields, Query, SharedStore},
    },
    models::application::{ApplicantInfo, ApplicationStatus, BusinessInfo, PartnerApplication},
    services::mirror::fetch_snapshot,
};

#[derive(Clone)]
pub struct ApplicationRepository {
    store: SharedStore,
}

impl ApplicationRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        applicant: &ApplicantInfo,
        business: &BusinessInfo,
        now: DateTime<Utc>,
    ) -> Result<PartnerApplication, AppError> {
        let data = json!({
            "applicantInfo": applicant,
            "businessInfo": business,
            "status": ApplicationStatus::Pending,
            "createdAt": timestamp::to_value(now),
            "updatedAt": timestamp::to_value(now),
        });
        let doc = self.store.create(collections::APPLICATIONS, data).await?;
        doc.decode()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<PartnerApplication>, AppError> {
        get_as(&self.store, collections::APPLICATIONS, id).await
    }

    pub async fn list_all(&self) -> Result<Vec<PartnerApplication>, AppError> {
        let query = Query::collection(collections::APPLICATIONS).order_by("createdAt", Direction::Desc);
        fetch_snapshot(&self.store, &query).await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: &ApplicationStatus,
        reviewed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(status));
        fields.insert("reviewedBy".into(), json!(reviewed_by));
        fields.insert("updatedAt".into(), timestamp::to_value(now));
        self.store.update(collections::APPLICATIONS, id, fields).await
    }
}

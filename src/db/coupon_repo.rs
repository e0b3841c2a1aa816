// src/db/coupon_repo.rs

use crate::{
    common::error::AppError,
    db::{
        collections,
        store::{get_as, Direction, Fields, Query, SharedStore},
    },
    models::coupon::SurveyCoupon,
    services::mirror::fetch_snapshot,
};

// Cupons de questionário (coleção `surveyResult`).
#[derive(Clone)]
pub struct CouponRepository {
    store: SharedStore,
}

impl CouponRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Todos os documentos com o código escaneado. Sem limite: a contagem
    /// decide entre inválido, único e ambíguo.
    pub async fn find_by_code(&self, code: &str) -> Result<Vec<SurveyCoupon>, AppError> {
        let query = Query::collection(collections::SURVEY_RESULTS).where_eq("qrCodeData", code);
        let docs = self.store.query(&query).await?;
        docs.iter().map(|doc| doc.decode()).collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<SurveyCoupon>, AppError> {
        get_as(&self.store, collections::SURVEY_RESULTS, id).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SurveyCoupon>, AppError> {
        let query = Query::collection(collections::SURVEY_RESULTS)
            .where_eq("userId", user_id)
            .order_by("createdAt", Direction::Desc);
        fetch_snapshot(&self.store, &query).await
    }

    pub async fn update_fields(&self, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store.update(collections::SURVEY_RESULTS, id, fields).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(collections::SURVEY_RESULTS, id).await
    }
}

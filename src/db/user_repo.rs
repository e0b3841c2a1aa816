// src/db/user_repo.rs

use chrono::Utc;
use serde_json::json;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{get_as, Fields, Query, SharedStore},
    },
    models::auth::{Role, UserAccount},
};

// O repositório de usuários, responsável pela coleção `users`
#[derive(Clone)]
pub struct UserRepository {
    store: SharedStore,
}

impl UserRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    // E-mails são guardados em minúsculas.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let query = Query::collection(collections::USERS)
            .where_eq("email", email.trim().to_lowercase())
            .limit(1);
        match self.store.query(&query).await?.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserAccount>, AppError> {
        get_as(&self.store, collections::USERS, id).await
    }

    pub async fn list_all(&self) -> Result<Vec<UserAccount>, AppError> {
        let docs = self.store.query(&Query::collection(collections::USERS)).await?;
        docs.iter().map(|doc| doc.decode()).collect()
    }

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<UserAccount, AppError> {
        // O hash não sai no Serialize do modelo, então o documento é montado à mão.
        let data = json!({
            "email": email.trim().to_lowercase(),
            "passwordHash": password_hash,
            "displayName": display_name.trim(),
            "phone": "",
            "role": Role::Customer,
            "isAdmin": false,
            "tokenVersion": 0,
            "createdAt": timestamp::to_value(Utc::now()),
        });

        let doc = self.store.create(collections::USERS, data).await?;
        doc.decode()
    }

    pub async fn update_fields(&self, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store.update(collections::USERS, id, fields).await.map_err(|e| match e {
            AppError::ResourceNotFound(_) => AppError::UserNotFound,
            other => other,
        })
    }
}

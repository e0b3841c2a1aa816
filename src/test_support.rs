// src/test_support.rs

//! Atalhos dos testes: store em memória, i18n e sessões prontas.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    common::i18n::I18nStore,
    db::{
        memory_store::MemoryDocumentStore,
        store::{DocumentStore, SharedStore},
    },
    models::auth::{Role, Session},
};

pub fn memory_store() -> (Arc<MemoryDocumentStore>, SharedStore) {
    let store = Arc::new(MemoryDocumentStore::new());
    let shared: SharedStore = store.clone();
    (store, shared)
}

pub fn i18n() -> Arc<I18nStore> {
    Arc::new(I18nStore::load().expect("locales válidos"))
}

pub async fn seed(store: &MemoryDocumentStore, collection: &str, id: &str, data: Value) {
    store.set(collection, id, data).await.expect("seed");
}

fn session(user_id: &str, role: Role, partner_id: Option<&str>) -> Session {
    Session {
        user_id: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        role,
        is_admin: role == Role::Admin,
        partner_id: partner_id.map(str::to_string),
    }
}

pub fn customer(user_id: &str) -> Session {
    session(user_id, Role::Customer, None)
}

pub fn agent(user_id: &str) -> Session {
    session(user_id, Role::Agent, None)
}

pub fn partner(user_id: &str, partner_id: &str) -> Session {
    session(user_id, Role::Partner, Some(partner_id))
}

pub fn admin() -> Session {
    session("admin", Role::Admin, None)
}

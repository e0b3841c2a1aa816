// src/services/profile_service.rs

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::Fields, PartnerRepository, UserRepository},
    models::{auth::Session, auth::UserAccount, partner::Partner},
    services::storage_service::{image_extension, put_with_retry, RetryPolicy, SharedObjectStorage},
};

// Imagem recebida do cliente, ainda não gravada.
pub struct ImageUpload<'a> {
    pub bytes: &'a [u8],
    pub content_type: &'a str,
}

#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    partner_repo: PartnerRepository,
    storage: SharedObjectStorage,
    retry: RetryPolicy,
}

impl ProfileService {
    pub fn new(
        user_repo: UserRepository,
        partner_repo: PartnerRepository,
        storage: SharedObjectStorage,
        retry: RetryPolicy,
    ) -> Self {
        Self { user_repo, partner_repo, storage, retry }
    }

    /// Troca a foto de perfil: grava o novo objeto, aponta `users/{uid}` para
    /// ele e só então remove o antigo.
    pub async fn upload_photo(&self, session: &Session, upload: ImageUpload<'_>) -> Result<UserAccount, AppError> {
        let mut user = self.user_repo.find_by_id(&session.user_id).await?.ok_or(AppError::UserNotFound)?;
        let (path, url) = self.store_image(&format!("users/{}", user.id), "photo", &upload).await?;

        let mut fields = Fields::new();
        fields.insert("photoUrl".into(), json!(url));
        fields.insert("photoPath".into(), json!(path));
        self.user_repo.update_fields(&user.id, fields).await?;

        self.discard(user.photo_path.take()).await;
        user.photo_url = Some(url);
        user.photo_path = Some(path);
        tracing::info!("🖼️ Foto de perfil atualizada para {}", user.id);
        Ok(user)
    }

    pub async fn upload_logo(
        &self,
        session: &Session,
        partner_id: &str,
        upload: ImageUpload<'_>,
    ) -> Result<Partner, AppError> {
        session.require_partner_or_admin(partner_id)?;
        let mut partner = self.partner(partner_id).await?;
        let (path, url) = self.store_image(&format!("partners/{}", partner.id), "logo", &upload).await?;

        let mut fields = Fields::new();
        fields.insert("logoUrl".into(), json!(url));
        fields.insert("logoPath".into(), json!(path));
        self.partner_repo.update_fields(&partner.id, fields).await?;

        self.discard(partner.logo_path.take()).await;
        partner.logo_url = Some(url);
        partner.logo_path = Some(path);
        tracing::info!("🖼️ Logo atualizado para o parceiro {}", partner.id);
        Ok(partner)
    }

    pub async fn get_partner(&self, partner_id: &str) -> Result<Partner, AppError> {
        self.partner(partner_id).await
    }

    pub async fn list_partners(&self, session: &Session) -> Result<Vec<Partner>, AppError> {
        session.require_admin()?;
        let mut partners = self.partner_repo.list_all().await?;
        partners.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(partners)
    }

    async fn partner(&self, partner_id: &str) -> Result<Partner, AppError> {
        self.partner_repo
            .find_by_id(partner_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("parceiro {}", partner_id)))
    }

    async fn store_image(&self, prefix: &str, stem: &str, upload: &ImageUpload<'_>) -> Result<(String, String), AppError> {
        let ext = image_extension(upload.content_type)
            .ok_or_else(|| AppError::InvalidInput(format!("tipo de arquivo não suportado: {}", upload.content_type)))?;
        if upload.bytes.is_empty() {
            return Err(AppError::InvalidInput("arquivo vazio".into()));
        }

        let path = format!("{}/{}-{}.{}", prefix, stem, Uuid::new_v4(), ext);
        put_with_retry(self.storage.as_ref(), self.retry, &path, upload.bytes, upload.content_type).await?;
        let url = self.storage.public_url(&path);
        Ok((path, url))
    }

    // Objeto antigo que sobrar não quebra nada; a falha só é registrada.
    async fn discard(&self, old_path: Option<String>) {
        let Some(path) = old_path else { return };
        if let Err(e) = self.storage.delete(&path).await {
            tracing::warn!("⚠️ Objeto antigo '{}' não removido: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::store::DocumentStore,
        services::storage_service::LocalObjectStorage,
        test_support::{admin, customer, memory_store, partner, seed},
    };
    use assert_matches::assert_matches;
    use std::{sync::Arc, time::Duration};

    async fn setup(root: &std::path::Path) -> (Arc<crate::db::memory_store::MemoryDocumentStore>, ProfileService) {
        let (store, shared) = memory_store();
        seed(&store, "users", "u1", json!({ "email": "u1@example.com" })).await;
        seed(&store, "partners", "p1", json!({ "name": "Chez Awa" })).await;
        seed(&store, "partners", "p2", json!({ "name": "boutique Binta" })).await;
        let storage: SharedObjectStorage = Arc::new(LocalObjectStorage::new(root, "http://files.test"));
        let service = ProfileService::new(
            UserRepository::new(shared.clone()),
            PartnerRepository::new(shared),
            storage,
            RetryPolicy::with_budget(Duration::from_millis(0)),
        );
        (store, service)
    }

    fn png(bytes: &[u8]) -> ImageUpload<'_> {
        ImageUpload { bytes, content_type: "image/png" }
    }

    #[tokio::test]
    async fn new_photo_replaces_the_old_object() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service) = setup(dir.path()).await;
        let me = customer("u1");

        let first = service.upload_photo(&me, png(b"one")).await.unwrap();
        let first_path = first.photo_path.clone().unwrap();
        assert!(dir.path().join(&first_path).exists());
        assert!(first.photo_url.unwrap().starts_with("http://files.test/users/u1/photo-"));

        let second = service.upload_photo(&me, png(b"two")).await.unwrap();
        let second_path = second.photo_path.unwrap();
        assert!(!dir.path().join(&first_path).exists());
        assert_eq!(std::fs::read(dir.path().join(&second_path)).unwrap(), b"two");

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data["photoPath"], second_path.as_str());
    }

    #[tokio::test]
    async fn non_images_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service) = setup(dir.path()).await;

        let upload = ImageUpload { bytes: b"%PDF", content_type: "application/pdf" };
        assert_matches!(
            service.upload_photo(&customer("u1"), upload).await,
            Err(AppError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn logo_belongs_to_the_partner() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service) = setup(dir.path()).await;

        assert_matches!(
            service.upload_logo(&partner("pu", "p2"), "p1", png(b"x")).await,
            Err(AppError::AccessDenied)
        );
        let updated = service.upload_logo(&partner("pu", "p1"), "p1", png(b"x")).await.unwrap();
        assert!(updated.logo_url.unwrap().contains("/partners/p1/logo-"));
        let doc = store.get("partners", "p1").await.unwrap().unwrap();
        assert!(doc.data["logoPath"].is_string());
    }

    #[tokio::test]
    async fn partners_are_listed_by_name_for_admins() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service) = setup(dir.path()).await;

        let names: Vec<String> = service.list_partners(&admin()).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["boutique Binta", "Chez Awa"]);
        assert_matches!(service.list_partners(&customer("u1")).await, Err(AppError::AccessDenied));
    }
}

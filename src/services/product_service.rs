// src/services/product_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::{store::Fields, ProductRepository},
    models::{
        auth::Session,
        product::{Product, ProductStatus, ProductView},
        status::StatusTaxonomy,
    },
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("validation.non_negative_price".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Thiéboudienne")]
    pub name: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 3500.0)]
    pub price: Decimal,

    #[serde(default)]
    pub description: String,
}

impl CreateProductPayload {
    // `length(min = 1)` aceita só espaços; o nome aparado também precisa existir.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.name.trim().is_empty() {
            let mut errors = validator::ValidationErrors::new();
            let mut err = ValidationError::new("length");
            err.message = Some("validation.required".into());
            errors.add("name", err);
            return Err(AppError::ValidationError(errors));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    i18n: Arc<I18nStore>,
}

impl ProductService {
    pub fn new(repo: ProductRepository, i18n: Arc<I18nStore>) -> Self {
        Self { repo, i18n }
    }

    /// Produto novo nasce `pending` e espera a revisão do admin.
    pub async fn create(
        &self,
        session: &Session,
        payload: &CreateProductPayload,
        lang: &str,
    ) -> Result<ProductView, AppError> {
        let partner_id = session.require_partner()?;
        payload.check()?;

        let product = self
            .repo
            .create(partner_id, &payload.name, payload.price, payload.description.trim(), Utc::now())
            .await?;
        tracing::info!("🛒 Produto {} criado pelo parceiro {}", product.id, partner_id);
        Ok(self.view(product, lang))
    }

    pub async fn list(&self, session: &Session, partner_id: &str, lang: &str) -> Result<Vec<ProductView>, AppError> {
        session.require_partner_or_admin(partner_id)?;
        let products = self.repo.list(partner_id).await?;
        Ok(products.into_iter().map(|p| self.view(p, lang)).collect())
    }

    pub async fn list_own(&self, session: &Session, lang: &str) -> Result<Vec<ProductView>, AppError> {
        let partner_id = session.require_partner()?;
        self.list(session, partner_id, lang).await
    }

    pub async fn delete(&self, session: &Session, partner_id: &str, id: &str) -> Result<(), AppError> {
        session.require_partner_or_admin(partner_id)?;
        self.load(partner_id, id).await?;
        self.repo.delete(partner_id, id).await
    }

    pub async fn review(
        &self,
        session: &Session,
        partner_id: &str,
        id: &str,
        status: ProductStatus,
        lang: &str,
    ) -> Result<ProductView, AppError> {
        session.require_admin()?;
        let mut product = self.load(partner_id, id).await?;
        if !matches!(status, ProductStatus::Approved | ProductStatus::Rejected) {
            return Err(AppError::InvalidTransition {
                from: product.status.to_string(),
                to: status.to_string(),
            });
        }

        let mut fields = Fields::new();
        fields.insert("status".into(), json!(status));
        fields.insert("reviewedBy".into(), json!(session.user_id));
        self.repo.update_fields(partner_id, id, fields).await?;

        product.status = status;
        product.reviewed_by = Some(session.user_id.clone());
        Ok(self.view(product, lang))
    }

    async fn load(&self, partner_id: &str, id: &str) -> Result<Product, AppError> {
        self.repo
            .find_by_id(partner_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("produto {}", id)))
    }

    fn view(&self, product: Product, lang: &str) -> ProductView {
        ProductView {
            badge: product.status.badge(lang, &self.i18n),
            product,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory_store::MemoryDocumentStore, store::DocumentStore},
        test_support::{admin, customer, i18n, memory_store, partner},
    };
    use assert_matches::assert_matches;

    fn setup() -> (Arc<MemoryDocumentStore>, ProductService) {
        let (store, shared) = memory_store();
        (store, ProductService::new(ProductRepository::new(shared), i18n()))
    }

    fn payload(name: &str, price: &str) -> CreateProductPayload {
        CreateProductPayload {
            name: name.into(),
            price: price.parse().unwrap(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn partner_creates_pending_products_under_its_own_path() {
        let (store, service) = setup();
        let shop = partner("pu", "p1");

        let view = service.create(&shop, &payload("Yassa", "2500"), "fr").await.unwrap();

        assert_eq!(view.product.status, ProductStatus::Pending);
        assert_eq!(view.badge.label, "En attente de validation");
        assert_eq!(store.count("partners/p1/products"), 1);
        assert_eq!(service.list_own(&shop, "fr").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_products_are_rejected() {
        let (_, service) = setup();
        let shop = partner("pu", "p1");

        assert_matches!(
            service.create(&shop, &payload("   ", "10"), "en").await,
            Err(AppError::ValidationError(_))
        );
        assert_matches!(
            service.create(&shop, &payload("Yassa", "-1"), "en").await,
            Err(AppError::ValidationError(_))
        );
        assert!(service.create(&shop, &payload("Eau", "0"), "en").await.is_ok());
        assert_matches!(
            service.create(&customer("u1"), &payload("Yassa", "1"), "en").await,
            Err(AppError::PartnerLinkMissing)
        );
    }

    #[tokio::test]
    async fn admin_reviews_and_partners_delete_their_own() {
        let (store, service) = setup();
        let shop = partner("pu", "p1");
        let created = service.create(&shop, &payload("Yassa", "2500"), "en").await.unwrap();
        let id = created.product.id;

        assert_matches!(
            service.review(&shop, "p1", &id, ProductStatus::Approved, "en").await,
            Err(AppError::AccessDenied)
        );
        let approved = service.review(&admin(), "p1", &id, ProductStatus::Approved, "en").await.unwrap();
        assert_eq!(approved.product.status, ProductStatus::Approved);
        let doc = store.get("partners/p1/products", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "approved");

        assert_matches!(
            service.delete(&partner("x", "p2"), "p1", &id).await,
            Err(AppError::AccessDenied)
        );
        service.delete(&shop, "p1", &id).await.unwrap();
        assert_eq!(store.count("partners/p1/products"), 0);
    }
}

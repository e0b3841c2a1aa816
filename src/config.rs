// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{
        memory_store::MemoryDocumentStore, pg_store::PgDocumentStore, store::SharedStore,
        ApplicationRepository, AppointmentRepository, CouponRepository, FinanceRepository,
        PartnerRepository, ProductRepository, TicketRepository, UserRepository,
    },
    services::{
        application_service::ApplicationService,
        appointment_service::AppointmentService,
        auth::AuthService,
        coupon_service::CouponService,
        document_service::DocumentService,
        finance_service::FinanceService,
        intent_log::IntentLog,
        mail::composer_from_name,
        product_service::ProductService,
        profile_service::ProfileService,
        storage_service::{LocalObjectStorage, RetryPolicy, SharedObjectStorage},
        ticket_service::TicketService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub storage_root: PathBuf,
    pub public_base_url: String,
    pub upload_retry_budget: Duration,
    pub mirror_page_size: usize,
    pub mail_composer: String,
    pub fonts_dir: PathBuf,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store_backend = match var_or("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("STORE_BACKEND desconhecido: {}", other),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida para STORE_BACKEND=postgres");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let upload_retry_secs: u64 = var_or("UPLOAD_MAX_RETRY_SECS", "600")
            .parse()
            .context("UPLOAD_MAX_RETRY_SECS deve ser um número de segundos")?;
        let mirror_page_size: usize = var_or("MIRROR_PAGE_SIZE", "50")
            .parse()
            .context("MIRROR_PAGE_SIZE deve ser um inteiro")?;

        Ok(Self {
            store_backend,
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            storage_root: PathBuf::from(var_or("STORAGE_ROOT", "./storage")),
            public_base_url: var_or("PUBLIC_BASE_URL", "http://localhost:3000/files"),
            upload_retry_budget: Duration::from_secs(upload_retry_secs),
            mirror_page_size,
            mail_composer: var_or("MAIL_COMPOSER", "log"),
            fonts_dir: PathBuf::from(var_or("FONTS_DIR", "./fonts")),
        })
    }
}

// O estado compartilhado por todos os handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub i18n_store: Arc<I18nStore>,
    pub storage: SharedObjectStorage,
    pub intent_log: IntentLog,
    pub auth_service: AuthService,
    pub ticket_service: TicketService,
    pub application_service: ApplicationService,
    pub appointment_service: AppointmentService,
    pub coupon_service: CouponService,
    pub product_service: ProductService,
    pub finance_service: FinanceService,
    pub document_service: DocumentService,
    pub profile_service: ProfileService,
}

impl AppState {
    /// Conecta ao store configurado e monta o estado.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: SharedStore = match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config.database_url.as_deref().context("DATABASE_URL ausente")?;
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgDocumentStore::connect(pool).await?)
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️ STORE_BACKEND=memory: os dados somem ao reiniciar");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let storage: SharedObjectStorage = Arc::new(LocalObjectStorage::new(
            config.storage_root.clone(),
            config.public_base_url.clone(),
        ));

        Self::with_store(config, store, storage)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(config: &Config, store: SharedStore, storage: SharedObjectStorage) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        let intent_log = IntentLog::new(store.clone());
        let mail = composer_from_name(&config.mail_composer);

        let user_repo = UserRepository::new(store.clone());
        let partner_repo = PartnerRepository::new(store.clone());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone());
        let ticket_service = TicketService::new(
            TicketRepository::new(store.clone()),
            user_repo.clone(),
            intent_log.clone(),
            i18n_store.clone(),
            config.mirror_page_size,
        );
        let application_service = ApplicationService::new(
            ApplicationRepository::new(store.clone()),
            intent_log.clone(),
            mail,
            i18n_store.clone(),
        );
        let appointment_service = AppointmentService::new(
            AppointmentRepository::new(store.clone()),
            intent_log.clone(),
            i18n_store.clone(),
            config.mirror_page_size,
        );
        let coupon_service = CouponService::new(CouponRepository::new(store.clone()), i18n_store.clone());
        let product_service = ProductService::new(ProductRepository::new(store.clone()), i18n_store.clone());
        let finance_service = FinanceService::new(FinanceRepository::new(store.clone()), partner_repo.clone());
        let document_service = DocumentService::new(config.fonts_dir.clone(), i18n_store.clone());
        let profile_service = ProfileService::new(
            user_repo,
            partner_repo,
            storage.clone(),
            RetryPolicy::with_budget(config.upload_retry_budget),
        );

        Ok(Self {
            store,
            i18n_store,
            storage,
            intent_log,
            auth_service,
            ticket_service,
            application_service,
            appointment_service,
            coupon_service,
            product_service,
            finance_service,
            document_service,
            profile_service,
        })
    }
}

// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;

use crate::{
    common::error::AppError,
    db::{store::Fields, UserRepository},
    models::auth::{Claims, Role, Session, UpdateClaimsPayload, UserAccount},
    services::projection::{project_users, SortOrder},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing fora do runtime assíncrono
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
            ?;

        let user = self
            .user_repo
            .create_user(email, &hashed_password, display_name)
            .await?;

        tracing::info!("👤 Usuário registrado: {}", user.id);
        self.create_token(&user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Valida o token e devolve a sessão com os claims que ele carrega.
    pub async fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self.user_repo
            .find_by_id(&token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // Token anterior ao último logout.
        if token_data.claims.ver != user.token_version {
            return Err(AppError::InvalidToken);
        }

        Ok(Session::from_claims(&token_data.claims))
    }

    /// Reemite o token com os claims atuais do store (após o admin mudar o papel).
    pub async fn refresh_token(&self, session: &Session) -> Result<String, AppError> {
        let user = self.me(session).await?;
        self.create_token(&user)
    }

    /// Revoga todos os tokens emitidos até agora.
    pub async fn logout(&self, session: &Session) -> Result<(), AppError> {
        let user = self.me(session).await?;

        let mut fields = Fields::new();
        fields.insert("tokenVersion".into(), json!(user.token_version + 1));
        self.user_repo.update_fields(&user.id, fields).await?;

        tracing::info!("🚪 Sessões de {} revogadas", user.id);
        Ok(())
    }

    pub async fn me(&self, session: &Session) -> Result<UserAccount, AppError> {
        self.user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn list_users(
        &self,
        session: &Session,
        search: Option<&str>,
        order: SortOrder,
    ) -> Result<Vec<UserAccount>, AppError> {
        session.require_admin()?;
        let users = self.user_repo.list_all().await?;
        Ok(project_users(&users, search, order))
    }

    /// Admin altera papel, flag de admin e vínculo de parceiro de um usuário.
    /// O usuário vê os novos claims no próximo refresh.
    pub async fn set_claims(
        &self,
        session: &Session,
        user_id: &str,
        payload: &UpdateClaimsPayload,
    ) -> Result<UserAccount, AppError> {
        session.require_admin()?;

        let partner_id = payload
            .partner_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if payload.role == Role::Partner && partner_id.is_none() {
            return Err(AppError::PartnerLinkMissing);
        }

        let mut fields = Fields::new();
        fields.insert("role".into(), json!(payload.role));
        fields.insert("isAdmin".into(), json!(payload.is_admin || payload.role == Role::Admin));
        fields.insert("partnerId".into(), json!(partner_id));
        self.user_repo.update_fields(user_id, fields).await?;

        tracing::info!("🔑 Claims de {} alterados por {}", user_id, session.user_id);
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user: &UserAccount) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            admin: user.is_admin,
            partner_id: user.partner_id.clone(),
            ver: user.token_version,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

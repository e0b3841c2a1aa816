// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Session,
};

/// 1. O Trait que define uma exigência de papel
pub trait RoleRequirement: Send + Sync + 'static {
    fn check(session: &Session) -> Result<(), AppError>;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(session) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if let Err(e) = T::check(&session) {
            let app_state = AppState::from_ref(state);
            let Ok(locale) = Locale::from_request_parts(parts, state).await;
            tracing::debug!("🚫 {} barrado em {}", session.user_id, parts.uri.path());
            return Err(e.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// EXIGÊNCIAS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn check(session: &Session) -> Result<(), AppError> {
        session.require_admin()
    }
}

pub struct PartnerOnly;
impl RoleRequirement for PartnerOnly {
    fn check(session: &Session) -> Result<(), AppError> {
        session.require_partner().map(|_| ())
    }
}

// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{error::AppError, timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Partner,
    Admin,
    // Papel desconhecido no documento cai para o menos privilegiado.
    #[default]
    #[serde(other)]
    Customer,
}

// Conta guardada na coleção `users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,

    #[schema(example = "awa@example.com")]
    pub email: String,

    // IMPORTANTE para segurança
    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[serde(default)]
    #[schema(example = "Awa Diallo")]
    pub display_name: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub photo_path: Option<String>,

    // Incrementada no logout: tokens com versão anterior deixam de valer.
    #[serde(default, skip_serializing)]
    #[schema(ignore)]
    pub token_version: u64,

    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,         // Subject (ID do usuário)
    pub email: String,
    pub role: Role,
    pub admin: bool,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub ver: u64,            // Versão da sessão (revogação no logout)
    pub exp: usize,          // Expiration time
    pub iat: usize,          // Issued At
}

/// Sessão resolvida uma vez na borda HTTP e passada explicitamente aos serviços.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub partner_id: Option<String>,
}

impl Session {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            role: claims.role,
            is_admin: claims.admin || claims.role == Role::Admin,
            partner_id: claims.partner_id.clone(),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::AccessDenied)
        }
    }

    /// Agentes e admins veem todos os tickets.
    pub fn is_staff(&self) -> bool {
        self.is_admin || self.role == Role::Agent
    }

    pub fn require_partner(&self) -> Result<&str, AppError> {
        self.partner_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AppError::PartnerLinkMissing)
    }

    /// O parceiro só age sobre os próprios dados; o admin age sobre qualquer um.
    pub fn require_partner_or_admin(&self, partner_id: &str) -> Result<(), AppError> {
        if self.is_admin {
            return Ok(());
        }
        if self.require_partner()? == partner_id {
            Ok(())
        } else {
            Err(AppError::AccessDenied)
        }
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "awa@example.com")]
    pub email: String,
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Awa Diallo")]
    pub display_name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Admin altera os claims de um usuário.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimsPayload {
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub partner_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn session(role: Role, partner: Option<&str>) -> Session {
        Session {
            user_id: "u1".into(),
            email: "u1@example.com".into(),
            role,
            is_admin: role == Role::Admin,
            partner_id: partner.map(str::to_string),
        }
    }

    #[test]
    fn partner_link_is_required_for_partner_actions() {
        assert_matches!(session(Role::Partner, None).require_partner(), Err(AppError::PartnerLinkMissing));
        assert_matches!(session(Role::Partner, Some("")).require_partner(), Err(AppError::PartnerLinkMissing));
        assert_eq!(session(Role::Partner, Some("p1")).require_partner().unwrap(), "p1");
    }

    #[test]
    fn partners_cannot_act_for_other_partners() {
        let partner = session(Role::Partner, Some("p1"));

        assert!(partner.require_partner_or_admin("p1").is_ok());
        assert_matches!(partner.require_partner_or_admin("p2"), Err(AppError::AccessDenied));
        assert!(session(Role::Admin, None).require_partner_or_admin("p2").is_ok());
    }

    #[test]
    fn unknown_role_decodes_as_customer() {
        let role: Role = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn known_roles_keep_their_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"customer\"");
        let admin: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(admin, Role::Admin);
        assert_eq!(Role::default(), Role::Customer);
    }
}

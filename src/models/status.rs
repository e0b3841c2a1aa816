// src/models/status.rs

//! Taxonomia de status.
//!
//! Cada entidade tem um conjunto fechado de códigos. A conversão de texto é
//! total: qualquer código desconhecido vira `Unknown(raw)` e o selo cai para
//! o rótulo "desconhecido", nunca para um erro.

use serde::Serialize;
use utoipa::ToSchema;

use crate::common::i18n::I18nStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

pub const UNKNOWN_STYLE: BadgeStyle = BadgeStyle {
    color: "#9E9E9E",
    icon: "help-outline",
};

pub const UNKNOWN_LABEL_KEY: &str = "status.unknown";

/// O que a tela precisa para desenhar o selo de status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadge {
    #[schema(example = "nouveau")]
    pub code: String,
    #[schema(example = "Nouveau")]
    pub label: String,
    #[schema(example = "#2196F3")]
    pub color: String,
    #[schema(example = "fiber-new")]
    pub icon: String,
}

pub trait StatusTaxonomy {
    /// Prefixo das chaves de tradução (`status.<kind>.<code>`).
    const KIND: &'static str;

    fn code(&self) -> &str;

    fn style(&self) -> Option<BadgeStyle>;

    fn badge(&self, lang: &str, i18n: &I18nStore) -> StatusBadge {
        let (style, label) = match self.style() {
            Some(style) => {
                let key = format!("status.{}.{}", Self::KIND, self.code());
                (style, i18n.translate(lang, &key))
            }
            None => (UNKNOWN_STYLE, i18n.translate(lang, UNKNOWN_LABEL_KEY)),
        };

        StatusBadge {
            code: self.code().to_string(),
            label,
            color: style.color.to_string(),
            icon: style.icon.to_string(),
        }
    }
}

macro_rules! status_taxonomy {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $kind:literal {
            $( $variant:ident => $code:literal, $color:literal, $icon:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            Unknown(String),
        }

        impl $name {
            pub const KNOWN: &'static [&'static str] = &[$( $code ),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $code, )+
                    Self::Unknown(raw) => raw.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::Unknown(String::new())
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $( $code => Self::$variant, )+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::from(raw.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                // Aceita qualquer JSON: o que não for texto vira Unknown.
                let raw = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                Ok(match raw {
                    serde_json::Value::String(s) => Self::from(s),
                    serde_json::Value::Null => Self::default(),
                    other => Self::Unknown(other.to_string()),
                })
            }
        }

        impl $crate::models::status::StatusTaxonomy for $name {
            const KIND: &'static str = $kind;

            fn code(&self) -> &str {
                self.as_str()
            }

            fn style(&self) -> Option<$crate::models::status::BadgeStyle> {
                match self {
                    $( Self::$variant => Some($crate::models::status::BadgeStyle { color: $color, icon: $icon }), )+
                    Self::Unknown(_) => None,
                }
            }
        }
    };
}

pub(crate) use status_taxonomy;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        application::ApplicationStatus, appointment::AppointmentStatus, coupon::CouponState,
        product::ProductStatus, ticket::TicketStatus,
    };

    fn i18n() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn every_known_code_has_a_translated_label() {
        let i18n = i18n();
        let mut badges = Vec::new();
        for code in TicketStatus::KNOWN {
            badges.push(TicketStatus::from(*code).badge("fr", &i18n));
        }
        for code in ApplicationStatus::KNOWN {
            badges.push(ApplicationStatus::from(*code).badge("fr", &i18n));
        }
        for code in AppointmentStatus::KNOWN {
            badges.push(AppointmentStatus::from(*code).badge("fr", &i18n));
        }
        for code in ProductStatus::KNOWN {
            badges.push(ProductStatus::from(*code).badge("fr", &i18n));
        }
        for code in CouponState::KNOWN {
            badges.push(CouponState::from(*code).badge("fr", &i18n));
        }

        for badge in badges {
            assert!(!badge.label.starts_with("status."), "untranslated: {}", badge.code);
            assert_ne!(badge.color, UNKNOWN_STYLE.color, "{} uses fallback color", badge.code);
        }
    }

    #[test]
    fn lookup_is_total_for_arbitrary_input() {
        let i18n = i18n();
        let unknown_label = i18n.translate("en", UNKNOWN_LABEL_KEY);

        for raw in ["", "TERMINÉ", "Nouveau", "archived", "🚀", "terminé "] {
            let badge = TicketStatus::from(raw).badge("en", &i18n);
            assert_eq!(badge.label, unknown_label, "input {:?}", raw);
            assert_eq!(badge.color, UNKNOWN_STYLE.color);
            assert_eq!(badge.code, raw);
        }
    }

    #[test]
    fn deserialization_never_fails() {
        let from_number: TicketStatus = serde_json::from_str("42").unwrap();
        let from_null: TicketStatus = serde_json::from_str("null").unwrap();
        let known: TicketStatus = serde_json::from_str("\"jey-handling\"").unwrap();

        assert_eq!(from_number, TicketStatus::Unknown("42".into()));
        assert_eq!(from_null, TicketStatus::default());
        assert_eq!(known, TicketStatus::JeyHandling);
    }

    #[test]
    fn codes_round_trip_through_text() {
        for code in TicketStatus::KNOWN {
            assert_eq!(TicketStatus::from(*code).as_str(), *code);
            assert!(TicketStatus::from(*code).is_known());
        }
    }
}

// src/models/intent.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{common::timestamp, db::store::Fields};

/// Uma escrita de companhia: a cópia desnormalizada que acompanha a escrita
/// principal de uma transição de status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CompanionWrite {
    /// Mescla campos. Com `tolerate_missing`, documento ausente não é falha.
    Update {
        collection: String,
        id: String,
        fields: Fields,
        #[serde(default)]
        tolerate_missing: bool,
    },
    /// Mescla se existir, cria se não existir.
    Merge {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Atualiza (ou acrescenta) o elemento de um array embutido cujo
    /// `match_key` vale `match_value`.
    PatchArrayEntry {
        collection: String,
        id: String,
        array_field: String,
        match_key: String,
        match_value: Value,
        fields: Fields,
    },
}

impl CompanionWrite {
    pub fn target(&self) -> String {
        match self {
            CompanionWrite::Update { collection, id, .. }
            | CompanionWrite::Merge { collection, id, .. }
            | CompanionWrite::PatchArrayEntry { collection, id, .. } => format!("{}/{}", collection, id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Pending,
    Completed,
}

// Documento de `pendingWrites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteIntent {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub kind: String,
    pub steps: Vec<CompanionWrite>,
    #[serde(default)]
    pub completed_steps: usize,
    pub status: IntentStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::millis", default = "timestamp::epoch")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn steps_are_tagged_by_operation() {
        let step = CompanionWrite::Update {
            collection: "partners/p1/rdv_reservation".into(),
            id: "a1".into(),
            fields: Fields::new(),
            tolerate_missing: true,
        };

        let raw = serde_json::to_value(&step).unwrap();

        assert_eq!(raw["op"], "update");
        assert_eq!(raw["tolerateMissing"], true);
        assert_eq!(serde_json::from_value::<CompanionWrite>(raw).unwrap(), step);
    }

    #[test]
    fn intent_decodes_without_optional_fields() {
        let raw = json!({ "kind": "x", "steps": [], "status": "pending" });
        let intent: WriteIntent = serde_json::from_value(raw).unwrap();

        assert_eq!(intent.completed_steps, 0);
        assert_eq!(intent.status, IntentStatus::Pending);
    }
}

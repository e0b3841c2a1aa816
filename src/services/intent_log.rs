// src/services/intent_log.rs

//! Log de intenções para as escritas de companhia.
//!
//! A escrita principal já foi feita quando chegamos aqui. Os passos de
//! companhia são gravados em `pendingWrites` antes de rodar; cada passo
//! concluído avança `completedSteps`. Uma falha deixa a intenção pendente
//! para `resume_pending` e nunca volta como erro para quem chamou.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, timestamp},
    db::{
        collections,
        store::{Fields, Query, SharedStore},
    },
    models::intent::{CompanionWrite, IntentStatus, WriteIntent},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentReport {
    // Vazio quando nem a intenção conseguiu ser gravada.
    pub intent_id: String,
    pub kind: String,
    pub completed: bool,
    pub completed_steps: usize,
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub resumed: usize,
    pub completed: usize,
    pub still_pending: usize,
}

#[derive(Clone)]
pub struct IntentLog {
    store: SharedStore,
}

impl IntentLog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn run(&self, kind: &str, steps: Vec<CompanionWrite>) -> IntentReport {
        let now = Utc::now();
        let mut intent = WriteIntent {
            id: String::new(),
            kind: kind.to_string(),
            steps,
            completed_steps: 0,
            status: IntentStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        match self.record(&intent).await {
            Ok(id) => intent.id = id,
            Err(e) => {
                // Sem registro não há retomada; ainda assim tentamos os passos.
                tracing::warn!("⚠️ Não foi possível gravar a intenção '{}': {}", kind, e);
            }
        }

        self.execute(intent).await
    }

    /// Reexecuta as intenções pendentes a partir do passo onde pararam.
    pub async fn resume_pending(&self) -> Result<ResumeSummary, AppError> {
        let query = Query::collection(collections::PENDING_WRITES).where_eq("status", "pending");
        let docs = self.store.query(&query).await?;

        let mut summary = ResumeSummary::default();
        for doc in docs {
            let intent: WriteIntent = match doc.decode() {
                Ok(intent) => intent,
                Err(e) => {
                    tracing::warn!("⚠️ Intenção {} ilegível, ignorada: {}", doc.id, e);
                    continue;
                }
            };

            summary.resumed += 1;
            let report = self.execute(intent).await;
            if report.completed {
                summary.completed += 1;
            } else {
                summary.still_pending += 1;
            }
        }

        if summary.resumed > 0 {
            tracing::info!(
                "🔁 Intenções retomadas: {} (concluídas: {}, pendentes: {})",
                summary.resumed,
                summary.completed,
                summary.still_pending
            );
        }
        Ok(summary)
    }

    async fn record(&self, intent: &WriteIntent) -> Result<String, AppError> {
        let data = serde_json::to_value(intent)?;
        let doc = self.store.create(collections::PENDING_WRITES, data).await?;
        Ok(doc.id)
    }

    async fn execute(&self, mut intent: WriteIntent) -> IntentReport {
        let total = intent.steps.len();

        while intent.completed_steps < total {
            let step = &intent.steps[intent.completed_steps];
            match self.apply_step(step).await {
                Ok(()) => {
                    intent.completed_steps += 1;
                    intent.last_error = None;
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Escrita de companhia falhou ({} em {}): {}",
                        intent.kind,
                        step.target(),
                        e
                    );
                    intent.last_error = Some(e.to_string());
                    break;
                }
            }
        }

        if intent.completed_steps == total {
            intent.status = IntentStatus::Completed;
        }
        self.save_progress(&intent).await;

        IntentReport {
            intent_id: intent.id.clone(),
            kind: intent.kind.clone(),
            completed: intent.status == IntentStatus::Completed,
            completed_steps: intent.completed_steps,
            total_steps: total,
            last_error: intent.last_error.clone(),
        }
    }

    async fn save_progress(&self, intent: &WriteIntent) {
        if intent.id.is_empty() {
            return;
        }

        let mut fields = Fields::new();
        fields.insert("completedSteps".into(), json!(intent.completed_steps));
        fields.insert("status".into(), json!(intent.status));
        fields.insert("lastError".into(), json!(intent.last_error));
        fields.insert("updatedAt".into(), timestamp::to_value(Utc::now()));

        if let Err(e) = self.store.update(collections::PENDING_WRITES, &intent.id, fields).await {
            tracing::warn!("⚠️ Progresso da intenção {} não gravado: {}", intent.id, e);
        }
    }

    async fn apply_step(&self, step: &CompanionWrite) -> Result<(), AppError> {
        match step {
            CompanionWrite::Update {
                collection,
                id,
                fields,
                tolerate_missing,
            } => match self.store.update(collection, id, fields.clone()).await {
                Err(AppError::ResourceNotFound(_)) if *tolerate_missing => {
                    tracing::debug!("Espelho {}/{} ausente; passo ignorado", collection, id);
                    Ok(())
                }
                other => other,
            },

            CompanionWrite::Merge { collection, id, fields } => {
                if self.store.get(collection, id).await?.is_some() {
                    self.store.update(collection, id, fields.clone()).await
                } else {
                    self.store.set(collection, id, Value::Object(fields.clone())).await
                }
            }

            CompanionWrite::PatchArrayEntry {
                collection,
                id,
                array_field,
                match_key,
                match_value,
                fields,
            } => {
                let doc = self
                    .store
                    .get(collection, id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound(format!("{}/{}", collection, id)))?;

                let mut entries = doc
                    .data
                    .get(array_field)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                let existing = entries
                    .iter_mut()
                    .filter_map(Value::as_object_mut)
                    .find(|entry| entry.get(match_key) == Some(match_value));

                match existing {
                    Some(entry) => entry.extend(fields.clone()),
                    None => {
                        let mut entry = fields.clone();
                        entry.insert(match_key.clone(), match_value.clone());
                        entries.push(Value::Object(entry));
                    }
                }

                let mut patch = Fields::new();
                patch.insert(array_field.clone(), Value::Array(entries));
                self.store.update(collection, id, patch).await
            }
        }
    }
}

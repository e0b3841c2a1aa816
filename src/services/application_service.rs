// src/services/application_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::{
    common::{error::AppError, i18n::I18nStore, timestamp},
    db::{collections, store::Fields, ApplicationRepository},
    models::{
        application::{
            ApplicantInfo, ApplicationListItem, ApplicationStatus, ApplicationStatusReport,
            BusinessInfo, PartnerApplication,
        },
        auth::Session,
        intent::CompanionWrite,
        status::StatusTaxonomy,
    },
    services::{
        intent_log::IntentLog,
        mail::{MailtoUri, SharedMailComposer},
        projection::{project_applications, NameSearch},
    },
};

#[derive(Clone)]
pub struct ApplicationService {
    repo: ApplicationRepository,
    intent_log: IntentLog,
    mail: SharedMailComposer,
    i18n: Arc<I18nStore>,
}

impl ApplicationService {
    pub fn new(
        repo: ApplicationRepository,
        intent_log: IntentLog,
        mail: SharedMailComposer,
        i18n: Arc<I18nStore>,
    ) -> Self {
        Self { repo, intent_log, mail, i18n }
    }

    pub async fn submit(
        &self,
        applicant: &ApplicantInfo,
        business: &BusinessInfo,
    ) -> Result<PartnerApplication, AppError> {
        let application = self.repo.create(applicant, business, Utc::now()).await?;
        tracing::info!("📨 Nova candidatura: {} ({})", application.id, business.business_name);
        Ok(application)
    }

    pub async fn list(
        &self,
        session: &Session,
        params: &NameSearch,
        lang: &str,
    ) -> Result<Vec<ApplicationListItem>, AppError> {
        session.require_admin()?;
        let raw = self.repo.list_all().await?;

        Ok(project_applications(&raw, params)
            .into_iter()
            .map(|application| ApplicationListItem {
                badge: application.status.badge(lang, &self.i18n),
                application,
            })
            .collect())
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<PartnerApplication, AppError> {
        session.require_admin()?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("candidatura {}", id)))
    }

    /// Grava o novo status. Aceite cria o parceiro como escrita de companhia;
    /// aceite e recusa preparam o e-mail ao candidato. Nem a companhia nem o
    /// compositor de e-mail desfazem a escrita principal.
    pub async fn update_status(
        &self,
        session: &Session,
        id: &str,
        status: ApplicationStatus,
        lang: &str,
    ) -> Result<ApplicationStatusReport, AppError> {
        let mut application = self.get(session, id).await?;
        if !status.is_known() {
            return Err(AppError::InvalidTransition {
                from: application.status.to_string(),
                to: status.to_string(),
            });
        }

        let now = Utc::now();
        self.repo.update_status(id, &status, &session.user_id, now).await?;
        application.status = status;
        application.reviewed_by = Some(session.user_id.clone());
        application.updated_at = now;
        tracing::info!("📋 Candidatura {} -> {}", id, application.status);

        let companion = if application.status == ApplicationStatus::Accepted {
            let steps = vec![CompanionWrite::Merge {
                collection: collections::PARTNERS.to_string(),
                id: application.id.clone(),
                fields: partner_fields(&application),
            }];
            Some(self.intent_log.run("application.accepted", steps).await)
        } else {
            None
        };

        let (mailto, mail_dispatched) = match self.compose_mail(&application, lang) {
            Some(mail) => {
                let dispatched = match self.mail.compose(&mail) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("⚠️ E-mail para {} não preparado: {}", mail.to, e);
                        false
                    }
                };
                (Some(mail.to_uri()), dispatched)
            }
            None => (None, false),
        };

        Ok(ApplicationStatusReport {
            badge: application.status.badge(lang, &self.i18n),
            application,
            mailto,
            mail_dispatched,
            companion,
        })
    }

    fn compose_mail(&self, application: &PartnerApplication, lang: &str) -> Option<MailtoUri> {
        if !application.status.notifies_applicant() {
            return None;
        }
        let prefix = match application.status {
            ApplicationStatus::Accepted => "mail.accepted",
            _ => "mail.rejected",
        };
        let args = [
            ("name", application.applicant_info.name.as_str()),
            ("business", application.business_info.business_name.as_str()),
        ];

        Some(MailtoUri::new(
            application.applicant_info.email.clone(),
            self.i18n.translate_with(lang, &format!("{}.subject", prefix), &args),
            self.i18n.translate_with(lang, &format!("{}.body", prefix), &args),
        ))
    }
}

fn partner_fields(application: &PartnerApplication) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), json!(application.business_info.business_name));
    fields.insert("email".into(), json!(application.applicant_info.email));
    fields.insert("phone".into(), json!(application.applicant_info.phone));
    fields.insert("category".into(), json!(application.business_info.category));
    fields.insert("address".into(), json!(application.business_info.address));
    fields.insert("applicationId".into(), json!(application.id));
    fields.insert("createdAt".into(), timestamp::to_value(application.updated_at));
    fields
}

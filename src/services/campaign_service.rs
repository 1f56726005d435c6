// src/services/campaign_service.rs

use std::sync::Arc;

use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::CampaignStore,
    models::{
        campaign::{
            CampaignDetail, CampaignPayload, EmailCampaign, EmailTemplate, NewEmailCampaign,
            NewEmailTemplate, TemplatePayload,
        },
        contact::Contact,
        entity::EntityKind,
    },
    services::{
        filter::{compile, parse_rules},
        record_service::RecordService,
    },
};

/// Templates de email e rascunhos de campanha sobre a base de contatos.
#[derive(Clone)]
pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    contacts: RecordService<Contact>,
}

impl CampaignService {
    pub fn new(store: Arc<dyn CampaignStore>, contacts: RecordService<Contact>) -> Self {
        Self { store, contacts }
    }

    // =========================================================================
    //  TEMPLATES
    // =========================================================================

    pub async fn list_templates(&self) -> Result<Vec<EmailTemplate>, AppError> {
        self.store.list_templates().await
    }

    pub async fn create_template(&self, payload: TemplatePayload, author: &str) -> Result<EmailTemplate, AppError> {
        payload.validate()?;

        let template = self
            .store
            .insert_template(&NewEmailTemplate {
                name: payload.name,
                subject: payload.subject,
                body_html: payload.body_html.unwrap_or_default(),
                created_by: Some(author.to_string()),
            })
            .await?;

        tracing::info!("✅ Template '{}' criado por {}", template.name, author);
        Ok(template)
    }

    pub async fn get_template(&self, id: i64) -> Result<EmailTemplate, AppError> {
        self.store
            .find_template(id)
            .await?
            .ok_or_else(|| AppError::not_found("Template", id))
    }

    pub async fn update_template(&self, id: i64, payload: TemplatePayload) -> Result<EmailTemplate, AppError> {
        payload.validate()?;

        let mut template = self.get_template(id).await?;
        template.name = payload.name;
        template.subject = payload.subject;
        if let Some(body_html) = payload.body_html {
            template.body_html = body_html;
        }

        self.store
            .update_template(&template)
            .await?
            .ok_or_else(|| AppError::not_found("Template", id))
    }

    pub async fn delete_template(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete_template(id).await? {
            return Err(AppError::not_found("Template", id));
        }
        tracing::info!("🗑️ Template {} removido", id);
        Ok(())
    }

    // =========================================================================
    //  CAMPANHAS
    // =========================================================================

    pub async fn list_campaigns(&self) -> Result<Vec<EmailCampaign>, AppError> {
        self.store.list_campaigns().await
    }

    /// Grava o rascunho; o público é contado aplicando as regras aos contatos.
    pub async fn create_campaign(&self, payload: CampaignPayload) -> Result<EmailCampaign, AppError> {
        payload.validate()?;

        if let Some(template_id) = payload.template_id {
            if self.store.find_template(template_id).await?.is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Template '{}' não existe",
                    template_id
                )));
            }
        }

        // Regras inválidas ou vazias = campanha para todos os contatos
        let filter_json = serialized_rules(payload.filter_json.as_ref());
        let rules = filter_json.as_deref().map(parse_rules).unwrap_or_default();
        let filter_json = if rules.is_empty() { None } else { filter_json };

        let predicate = compile(EntityKind::Contact, &rules);
        let recipient_count = self.contacts.count_matching(&predicate).await?;

        let campaign = self
            .store
            .insert_campaign(&NewEmailCampaign {
                template_id: payload.template_id,
                sender_id: payload.sender_id,
                subject: payload.subject,
                filter_json,
                recipient_count,
            })
            .await?;

        tracing::info!(
            "📧 Rascunho de campanha {} criado para {} contatos",
            campaign.id,
            campaign.recipient_count
        );
        Ok(campaign)
    }

    pub async fn get_campaign(&self, id: i64) -> Result<CampaignDetail, AppError> {
        let campaign = self
            .store
            .find_campaign(id)
            .await?
            .ok_or_else(|| AppError::not_found("Campanha", id))?;

        let template = match campaign.template_id {
            Some(template_id) => self.store.find_template(template_id).await?,
            None => None,
        };

        Ok(CampaignDetail { campaign, template })
    }
}

/// Aceita a lista de regras como JSON ou já serializada em string
fn serialized_rules(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_store::{MemoryCampaignStore, MemoryFieldStore, MemoryRecordStore},
        models::contact::ContactDraft,
        services::field_service::FieldService,
    };
    use serde_json::json;

    async fn service_with_contacts(statuses: &[Option<&str>]) -> CampaignService {
        let fields = FieldService::new(Arc::new(MemoryFieldStore::new()));
        let contacts = RecordService::new(Arc::new(MemoryRecordStore::<Contact>::new()), fields, 50);
        for (i, status) in statuses.iter().enumerate() {
            contacts
                .create(ContactDraft {
                    first_name: format!("Nome{i}"),
                    last_name: "Lima".into(),
                    email: format!("c{i}@lima.com"),
                    contact_status: status.map(str::to_string),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        CampaignService::new(Arc::new(MemoryCampaignStore::new()), contacts)
    }

    fn template(name: &str) -> TemplatePayload {
        TemplatePayload {
            name: name.into(),
            subject: "Assunto".into(),
            body_html: Some("<p>Olá</p>".into()),
        }
    }

    fn campaign(filter_json: Option<Value>) -> CampaignPayload {
        CampaignPayload {
            subject: "Novidades".into(),
            sender_id: Some(1),
            filter_json,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn recipient_count_follows_filter_rules() {
        let service = service_with_contacts(&[Some("Active"), Some("Active"), Some("Former"), None]).await;

        let rules = json!([{"field": "contactStatus", "operator": "equals", "value": "Active"}]);
        let created = service.create_campaign(campaign(Some(rules.clone()))).await.unwrap();
        assert_eq!(created.recipient_count, 2);
        assert_eq!(created.filter_json.as_deref(), Some(rules.to_string().as_str()));

        // A mesma lista já serializada
        let from_string = service
            .create_campaign(campaign(Some(Value::String(rules.to_string()))))
            .await
            .unwrap();
        assert_eq!(from_string.recipient_count, 2);
    }

    #[tokio::test]
    async fn missing_or_malformed_filter_targets_everyone() {
        let service = service_with_contacts(&[Some("Active"), None, None]).await;

        let no_filter = service.create_campaign(campaign(None)).await.unwrap();
        assert_eq!((no_filter.recipient_count, no_filter.filter_json), (3, None));

        let broken = service
            .create_campaign(campaign(Some(json!("[{not json"))))
            .await
            .unwrap();
        assert_eq!((broken.recipient_count, broken.filter_json), (3, None));
    }

    #[tokio::test]
    async fn campaign_requires_subject_and_known_template() {
        let service = service_with_contacts(&[]).await;

        let mut no_subject = campaign(None);
        no_subject.subject = String::new();
        assert!(matches!(
            service.create_campaign(no_subject).await,
            Err(AppError::ValidationError(_))
        ));

        let mut unknown_template = campaign(None);
        unknown_template.template_id = Some(99);
        assert!(matches!(
            service.create_campaign(unknown_template).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn detail_resolves_template_until_it_is_deleted() {
        let service = service_with_contacts(&[Some("Active")]).await;
        let tpl = service.create_template(template("Boas-vindas"), "user-1").await.unwrap();
        assert_eq!(tpl.created_by.as_deref(), Some("user-1"));

        let mut payload = campaign(None);
        payload.template_id = Some(tpl.id);
        let created = service.create_campaign(payload).await.unwrap();

        let detail = service.get_campaign(created.id).await.unwrap();
        assert_eq!(detail.template.map(|t| t.name), Some("Boas-vindas".to_string()));

        service.delete_template(tpl.id).await.unwrap();
        let detail = service.get_campaign(created.id).await.unwrap();
        assert_eq!(detail.campaign.template_id, None);
        assert!(detail.template.is_none());

        assert!(matches!(service.get_campaign(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn template_update_keeps_body_when_absent() {
        let service = service_with_contacts(&[]).await;
        let tpl = service.create_template(template("Antigo"), "user-1").await.unwrap();

        let updated = service
            .update_template(
                tpl.id,
                TemplatePayload {
                    name: "Novo".into(),
                    subject: "Outro assunto".into(),
                    body_html: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Novo");
        assert_eq!(updated.body_html, "<p>Olá</p>");

        assert!(matches!(
            service.update_template(tpl.id, TemplatePayload::default()).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(service.delete_template(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let service = service_with_contacts(&[]).await;
        let first = service.create_campaign(campaign(None)).await.unwrap();
        let second = service.create_campaign(campaign(None)).await.unwrap();

        let ids: Vec<_> = service.list_campaigns().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}

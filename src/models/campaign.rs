// src/models/campaign.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- TEMPLATES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Convite para webinar")]
    pub name: String,
    #[schema(example = "Você está convidado!")]
    pub subject: String,
    pub body_html: String,
    // `sub` do token de quem criou
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Convite para webinar")]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "O assunto é obrigatório."))]
    #[schema(example = "Você está convidado!")]
    pub subject: String,

    // Ausente no PUT = mantém o corpo atual
    pub body_html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEmailTemplate {
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub created_by: Option<String>,
}

// --- CAMPANHAS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailCampaign {
    pub id: i64,
    pub template_id: Option<i64>,
    pub sender_id: Option<i64>,
    pub subject: String,
    // Regras serializadas: [{field, operator, value}] sobre contatos
    pub filter_json: Option<String>,
    pub recipient_count: i64,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPayload {
    pub template_id: Option<i64>,
    pub sender_id: Option<i64>,

    #[serde(default)]
    #[validate(length(min = 1, message = "O assunto é obrigatório."))]
    #[schema(example = "Novidades de março")]
    pub subject: String,

    // Lista de regras ou string com a lista serializada
    #[schema(example = json!([{"field": "contactStatus", "operator": "equals", "value": "Active"}]))]
    pub filter_json: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewEmailCampaign {
    pub template_id: Option<i64>,
    pub sender_id: Option<i64>,
    pub subject: String,
    pub filter_json: Option<String>,
    pub recipient_count: i64,
}

/// Campanha com o template resolvido
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: EmailCampaign,
    pub template: Option<EmailTemplate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_name_and_subject_fail_validation() {
        let payload: TemplatePayload = serde_json::from_value(json!({ "bodyHtml": "<p>oi</p>" })).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("subject"));
    }

    #[test]
    fn detail_flattens_the_campaign() {
        let detail = CampaignDetail {
            campaign: EmailCampaign {
                id: 3,
                template_id: None,
                sender_id: Some(2),
                subject: "Oi".into(),
                filter_json: None,
                recipient_count: 10,
                status: CampaignStatus::Draft,
                created_at: Utc::now(),
            },
            template: None,
        };
        let body = serde_json::to_value(&detail).unwrap();
        assert_eq!(body["recipientCount"], 10);
        assert_eq!(body["status"], "draft");
        assert!(body["template"].is_null());
    }
}

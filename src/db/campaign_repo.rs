// src/db/campaign_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::CampaignStore,
    models::campaign::{EmailCampaign, EmailTemplate, NewEmailCampaign, NewEmailTemplate},
};

#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for CampaignRepository {
    // =========================================================================
    //  TEMPLATES
    // =========================================================================

    async fn insert_template(&self, new: &NewEmailTemplate) -> Result<EmailTemplate, AppError> {
        let template = sqlx::query_as::<_, EmailTemplate>(
            r#"
            INSERT INTO email_templates (name, subject, body_html, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.subject)
        .bind(&new.body_html)
        .bind(&new.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(template)
    }

    async fn find_template(&self, id: i64) -> Result<Option<EmailTemplate>, AppError> {
        let template = sqlx::query_as::<_, EmailTemplate>("SELECT * FROM email_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(template)
    }

    async fn list_templates(&self) -> Result<Vec<EmailTemplate>, AppError> {
        let templates = sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    async fn update_template(&self, template: &EmailTemplate) -> Result<Option<EmailTemplate>, AppError> {
        let updated = sqlx::query_as::<_, EmailTemplate>(
            r#"
            UPDATE email_templates
            SET name = $2, subject = $3, body_html = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body_html)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        // Campanhas que usavam o template ficam com template_id NULL (FK)
        let result = sqlx::query("DELETE FROM email_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  CAMPANHAS
    // =========================================================================

    async fn insert_campaign(&self, new: &NewEmailCampaign) -> Result<EmailCampaign, AppError> {
        let campaign = sqlx::query_as::<_, EmailCampaign>(
            r#"
            INSERT INTO email_campaigns (template_id, sender_id, subject, filter_json, recipient_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.template_id)
        .bind(new.sender_id)
        .bind(&new.subject)
        .bind(&new.filter_json)
        .bind(new.recipient_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(campaign)
    }

    async fn find_campaign(&self, id: i64) -> Result<Option<EmailCampaign>, AppError> {
        let campaign = sqlx::query_as::<_, EmailCampaign>("SELECT * FROM email_campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(campaign)
    }

    async fn list_campaigns(&self) -> Result<Vec<EmailCampaign>, AppError> {
        let campaigns = sqlx::query_as::<_, EmailCampaign>(
            "SELECT * FROM email_campaigns ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(campaigns)
    }
}

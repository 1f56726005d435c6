pub mod record_repo;
pub use record_repo::RecordRepository;
pub mod field_repo;
pub use field_repo::FieldRepository;
pub mod campaign_repo;
pub use campaign_repo::CampaignRepository;
#[cfg(test)]
pub mod memory_store;

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        campaign::{EmailCampaign, EmailTemplate, NewEmailCampaign, NewEmailTemplate},
        entity::{Column, CrmRecord, EntityKind},
        fields::{FieldDefinition, FieldValue, NewFieldDefinition, NewFieldValue},
    },
    services::filter::Predicate,
};

/// Consulta já compilada: predicado + ordenação + paginação opcional.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub predicate: Predicate,
    pub sort: &'static Column,
    pub descending: bool,
    // None = sem paginação (export "all")
    pub limit: Option<i64>,
    pub offset: i64,
}

// O contrato de armazenamento de Accounts/Contacts. O Postgres é a implementação
// real; os testes usam a versão em memória.
#[async_trait]
pub trait RecordStore<R: CrmRecord>: Send + Sync {
    async fn insert(&self, record: &R) -> Result<R, AppError>;

    /// Grava as colunas editáveis; `None` se o id não existir
    async fn update(&self, record: &R) -> Result<Option<R>, AppError>;

    async fn find(&self, id: &str) -> Result<Option<R>, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn find_many(&self, query: &RecordQuery) -> Result<Vec<R>, AppError>;

    async fn count(&self, predicate: &Predicate) -> Result<i64, AppError>;
}

#[async_trait]
pub trait FieldStore: Send + Sync {
    // --- Definições ---

    async fn insert_definition(&self, new: &NewFieldDefinition) -> Result<FieldDefinition, AppError>;

    async fn find_definition(&self, id: i64) -> Result<Option<FieldDefinition>, AppError>;

    async fn find_definition_by_key(
        &self,
        entity: EntityKind,
        field_key: &str,
    ) -> Result<Option<FieldDefinition>, AppError>;

    /// Ordenadas por sort_order
    async fn list_definitions(&self, entity: EntityKind) -> Result<Vec<FieldDefinition>, AppError>;

    async fn max_sort_order(&self, entity: EntityKind) -> Result<Option<i32>, AppError>;

    async fn update_definition(&self, definition: &FieldDefinition) -> Result<Option<FieldDefinition>, AppError>;

    /// Apaga os valores e depois a definição; retorna quantos valores foram removidos
    async fn delete_definition(&self, id: i64) -> Result<u64, AppError>;

    // --- Valores ---

    /// Upsert atômico por (field_definition_id, record_id)
    async fn upsert_value(&self, value: &NewFieldValue) -> Result<FieldValue, AppError>;

    async fn list_values(&self, entity: EntityKind, record_id: &str) -> Result<Vec<FieldValue>, AppError>;

    async fn list_values_for_records(
        &self,
        entity: EntityKind,
        record_ids: &[String],
    ) -> Result<Vec<FieldValue>, AppError>;

    async fn count_values(&self, field_definition_id: i64) -> Result<i64, AppError>;

    async fn delete_values_for_record(&self, entity: EntityKind, record_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    // --- Templates ---

    async fn insert_template(&self, new: &NewEmailTemplate) -> Result<EmailTemplate, AppError>;

    async fn find_template(&self, id: i64) -> Result<Option<EmailTemplate>, AppError>;

    /// Mais recentes primeiro (updated_at)
    async fn list_templates(&self) -> Result<Vec<EmailTemplate>, AppError>;

    /// Grava nome, assunto e corpo; `None` se o id não existir
    async fn update_template(&self, template: &EmailTemplate) -> Result<Option<EmailTemplate>, AppError>;

    async fn delete_template(&self, id: i64) -> Result<bool, AppError>;

    // --- Campanhas ---

    async fn insert_campaign(&self, new: &NewEmailCampaign) -> Result<EmailCampaign, AppError>;

    async fn find_campaign(&self, id: i64) -> Result<Option<EmailCampaign>, AppError>;

    /// Mais recentes primeiro (created_at)
    async fn list_campaigns(&self) -> Result<Vec<EmailCampaign>, AppError>;
}

// src/db/memory_store.rs
//
// Stores em memória para os testes dos services. Seguem a mesma semântica
// do Postgres: predicado avaliado por `Predicate::matches`, NULLS LAST,
// upsert por (field_definition_id, record_id) e unicidade de chaves.

use std::{cmp::Ordering, sync::atomic::{AtomicI64, Ordering as AtomicOrdering}};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::{CampaignStore, FieldStore, RecordQuery, RecordStore},
    models::{
        campaign::{CampaignStatus, EmailCampaign, EmailTemplate, NewEmailCampaign, NewEmailTemplate},
        entity::{Cell, CrmRecord, EntityKind},
        fields::{FieldDefinition, FieldValue, NewFieldDefinition, NewFieldValue},
    },
    services::filter::Predicate,
};

pub struct MemoryRecordStore<R> {
    records: RwLock<Vec<R>>,
}

impl<R: CrmRecord> MemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn ids(&self) -> Vec<String> {
        self.records.read().await.iter().map(|r| r.id().to_string()).collect()
    }
}

fn compare(a: &Cell, b: &Cell, descending: bool) -> Ordering {
    // Nulos continuam no fim mesmo em ordem decrescente
    if descending && !a.is_null() && !b.is_null() {
        b.sort_cmp(a)
    } else {
        a.sort_cmp(b)
    }
}

#[async_trait]
impl<R: CrmRecord> RecordStore<R> for MemoryRecordStore<R> {
    async fn insert(&self, record: &R) -> Result<R, AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(AppError::RecordAlreadyExists(format!(
                "{} '{}' já existe",
                R::KIND,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &R) -> Result<Option<R>, AppError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find(&self, id: &str) -> Result<Option<R>, AppError> {
        Ok(self.records.read().await.iter().find(|r| r.id() == id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() < before)
    }

    async fn find_many(&self, query: &RecordQuery) -> Result<Vec<R>, AppError> {
        let records = self.records.read().await;
        let mut found: Vec<R> = records
            .iter()
            .filter(|r| query.predicate.matches(*r))
            .cloned()
            .collect();

        let key = query.sort.key;
        found.sort_by(|a, b| {
            compare(&a.cell(key), &b.cell(key), query.descending).then_with(|| a.id().cmp(b.id()))
        });

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let page = found.into_iter().skip(offset);
        Ok(match query.limit {
            Some(limit) => page.take(usize::try_from(limit).unwrap_or(0)).collect(),
            None => page.collect(),
        })
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| predicate.matches(*r)).count() as i64)
    }
}

pub struct MemoryFieldStore {
    definitions: RwLock<Vec<FieldDefinition>>,
    values: RwLock<Vec<FieldValue>>,
    next_id: AtomicI64,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(Vec::new()),
            values: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, AtomicOrdering::SeqCst)
    }

    pub async fn value_rows(&self) -> Vec<FieldValue> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl FieldStore for MemoryFieldStore {
    async fn insert_definition(&self, new: &NewFieldDefinition) -> Result<FieldDefinition, AppError> {
        let mut definitions = self.definitions.write().await;
        if definitions
            .iter()
            .any(|d| d.entity == new.entity && d.field_key == new.field_key)
        {
            return Err(AppError::DuplicateField(format!(
                "Já existe um campo com a chave '{}' em {}",
                new.field_key, new.entity
            )));
        }

        let definition = FieldDefinition {
            id: self.next_id(),
            entity: new.entity,
            field_key: new.field_key.clone(),
            label: new.label.clone(),
            field_type: new.field_type,
            options_json: new.options_json.clone(),
            is_required: new.is_required,
            show_in_table: new.show_in_table,
            sort_order: new.sort_order,
            created_at: Utc::now(),
        };
        definitions.push(definition.clone());
        Ok(definition)
    }

    async fn find_definition(&self, id: i64) -> Result<Option<FieldDefinition>, AppError> {
        Ok(self.definitions.read().await.iter().find(|d| d.id == id).cloned())
    }

    async fn find_definition_by_key(
        &self,
        entity: EntityKind,
        field_key: &str,
    ) -> Result<Option<FieldDefinition>, AppError> {
        Ok(self
            .definitions
            .read()
            .await
            .iter()
            .find(|d| d.entity == entity && d.field_key == field_key)
            .cloned())
    }

    async fn list_definitions(&self, entity: EntityKind) -> Result<Vec<FieldDefinition>, AppError> {
        let mut found: Vec<FieldDefinition> = self
            .definitions
            .read()
            .await
            .iter()
            .filter(|d| d.entity == entity)
            .cloned()
            .collect();
        found.sort_by_key(|d| (d.sort_order, d.id));
        Ok(found)
    }

    async fn max_sort_order(&self, entity: EntityKind) -> Result<Option<i32>, AppError> {
        Ok(self
            .definitions
            .read()
            .await
            .iter()
            .filter(|d| d.entity == entity)
            .map(|d| d.sort_order)
            .max())
    }

    async fn update_definition(&self, definition: &FieldDefinition) -> Result<Option<FieldDefinition>, AppError> {
        let mut definitions = self.definitions.write().await;
        let Some(slot) = definitions.iter_mut().find(|d| d.id == definition.id) else {
            return Ok(None);
        };
        slot.label = definition.label.clone();
        slot.options_json = definition.options_json.clone();
        slot.is_required = definition.is_required;
        slot.show_in_table = definition.show_in_table;
        slot.sort_order = definition.sort_order;
        Ok(Some(slot.clone()))
    }

    async fn delete_definition(&self, id: i64) -> Result<u64, AppError> {
        let mut values = self.values.write().await;
        let before = values.len();
        values.retain(|v| v.field_definition_id != id);
        let removed = (before - values.len()) as u64;

        self.definitions.write().await.retain(|d| d.id != id);
        Ok(removed)
    }

    async fn upsert_value(&self, value: &NewFieldValue) -> Result<FieldValue, AppError> {
        let mut values = self.values.write().await;
        let now = Utc::now();

        if let Some(existing) = values.iter_mut().find(|v| {
            v.field_definition_id == value.field_definition_id && v.record_id == value.record_id
        }) {
            existing.value_text = value.value_text.clone();
            existing.value_number = value.value_number;
            existing.value_boolean = value.value_boolean;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let stored = FieldValue {
            id: self.next_id(),
            field_definition_id: value.field_definition_id,
            entity: value.entity,
            record_id: value.record_id.clone(),
            value_text: value.value_text.clone(),
            value_number: value.value_number,
            value_boolean: value.value_boolean,
            updated_at: now,
        };
        values.push(stored.clone());
        Ok(stored)
    }

    async fn list_values(&self, entity: EntityKind, record_id: &str) -> Result<Vec<FieldValue>, AppError> {
        Ok(self
            .values
            .read()
            .await
            .iter()
            .filter(|v| v.entity == entity && v.record_id == record_id)
            .cloned()
            .collect())
    }

    async fn list_values_for_records(
        &self,
        entity: EntityKind,
        record_ids: &[String],
    ) -> Result<Vec<FieldValue>, AppError> {
        Ok(self
            .values
            .read()
            .await
            .iter()
            .filter(|v| v.entity == entity && record_ids.contains(&v.record_id))
            .cloned()
            .collect())
    }

    async fn count_values(&self, field_definition_id: i64) -> Result<i64, AppError> {
        Ok(self
            .values
            .read()
            .await
            .iter()
            .filter(|v| v.field_definition_id == field_definition_id)
            .count() as i64)
    }

    async fn delete_values_for_record(&self, entity: EntityKind, record_id: &str) -> Result<u64, AppError> {
        let mut values = self.values.write().await;
        let before = values.len();
        values.retain(|v| !(v.entity == entity && v.record_id == record_id));
        Ok((before - values.len()) as u64)
    }
}

pub struct MemoryCampaignStore {
    templates: RwLock<Vec<EmailTemplate>>,
    campaigns: RwLock<Vec<EmailCampaign>>,
    next_id: AtomicI64,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(Vec::new()),
            campaigns: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn insert_template(&self, new: &NewEmailTemplate) -> Result<EmailTemplate, AppError> {
        let now = Utc::now();
        let template = EmailTemplate {
            id: self.next_id(),
            name: new.name.clone(),
            subject: new.subject.clone(),
            body_html: new.body_html.clone(),
            created_by: new.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        self.templates.write().await.push(template.clone());
        Ok(template)
    }

    async fn find_template(&self, id: i64) -> Result<Option<EmailTemplate>, AppError> {
        Ok(self.templates.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<EmailTemplate>, AppError> {
        let mut found = self.templates.read().await.clone();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn update_template(&self, template: &EmailTemplate) -> Result<Option<EmailTemplate>, AppError> {
        let mut templates = self.templates.write().await;
        let Some(slot) = templates.iter_mut().find(|t| t.id == template.id) else {
            return Ok(None);
        };
        slot.name = template.name.clone();
        slot.subject = template.subject.clone();
        slot.body_html = template.body_html.clone();
        slot.updated_at = Utc::now();
        Ok(Some(slot.clone()))
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }

        // Mesmo efeito do ON DELETE SET NULL
        for campaign in self.campaigns.write().await.iter_mut() {
            if campaign.template_id == Some(id) {
                campaign.template_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_campaign(&self, new: &NewEmailCampaign) -> Result<EmailCampaign, AppError> {
        let campaign = EmailCampaign {
            id: self.next_id(),
            template_id: new.template_id,
            sender_id: new.sender_id,
            subject: new.subject.clone(),
            filter_json: new.filter_json.clone(),
            recipient_count: new.recipient_count,
            status: CampaignStatus::Draft,
            created_at: Utc::now(),
        };
        self.campaigns.write().await.push(campaign.clone());
        Ok(campaign)
    }

    async fn find_campaign(&self, id: i64) -> Result<Option<EmailCampaign>, AppError> {
        Ok(self.campaigns.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn list_campaigns(&self) -> Result<Vec<EmailCampaign>, AppError> {
        let mut found = self.campaigns.read().await.clone();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found)
    }
}

// src/services/record_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{RecordQuery, RecordStore},
    models::{
        entity::{Cell, Column, CrmRecord, EntityKind, RecordDraft},
        fields::CustomFieldEntry,
        listing::{ListParams, Paginated},
    },
    services::{
        field_service::FieldService,
        filter::{build_predicate, Predicate},
    },
};

/// CRUD + listagem de um tipo de registro base (Account ou Contact).
pub struct RecordService<R: CrmRecord> {
    records: Arc<dyn RecordStore<R>>,
    fields: FieldService,
    rows_per_page: i64,
}

impl<R: CrmRecord> Clone for RecordService<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            fields: self.fields.clone(),
            rows_per_page: self.rows_per_page,
        }
    }
}

impl<R: CrmRecord> RecordService<R> {
    pub fn new(records: Arc<dyn RecordStore<R>>, fields: FieldService, rows_per_page: i64) -> Self {
        Self {
            records,
            fields,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn fields(&self) -> &FieldService {
        &self.fields
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create(&self, draft: R::Draft) -> Result<R, AppError> {
        draft.validate()?;

        let id = match draft.requested_id().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => generate_id(R::KIND),
        };

        let record = R::from_draft(id, draft, Utc::now());
        let created = self.records.insert(&record).await?;

        tracing::info!("✅ {} '{}' criado", R::KIND, created.id());
        Ok(created)
    }

    /// Substitui as colunas editáveis e aplica `customFieldValues`, se vier.
    pub async fn update(
        &self,
        id: &str,
        draft: R::Draft,
        custom_values: &HashMap<i64, Value>,
    ) -> Result<R, AppError> {
        draft.validate()?;

        let mut record = self.find(id).await?;
        record.apply_draft(draft, Utc::now());

        let updated = self
            .records
            .update(&record)
            .await?
            .ok_or_else(|| AppError::not_found(self.label(), id))?;

        if !custom_values.is_empty() {
            self.fields.set_values(R::KIND, id, custom_values).await?;
        }

        tracing::info!("✏️ {} '{}' atualizado", R::KIND, id);
        Ok(updated)
    }

    /// Remove o registro e os valores customizados dele.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.records.delete(id).await? {
            return Err(AppError::not_found(self.label(), id));
        }

        let removed = self.fields.delete_values_for_record(R::KIND, id).await?;
        tracing::info!("🗑️ {} '{}' removido ({} valores customizados)", R::KIND, id, removed);
        Ok(())
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn find(&self, id: &str) -> Result<R, AppError> {
        self.records
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(self.label(), id))
    }

    pub async fn find_optional(&self, id: &str) -> Result<Option<R>, AppError> {
        self.records.find(id).await
    }

    /// Registro + campos customizados gravados
    pub async fn detail(&self, id: &str) -> Result<(R, Vec<CustomFieldEntry>), AppError> {
        let record = self.find(id).await?;
        let custom_fields = self.fields.get_values(R::KIND, id).await?;
        Ok((record, custom_fields))
    }

    /// Registros cujo campo `key` é igual a `value` (ex: contatos de uma conta)
    pub async fn find_by(&self, key: &str, value: &str) -> Result<Vec<R>, AppError> {
        let column = R::KIND
            .column(key)
            .ok_or_else(|| anyhow::anyhow!("Coluna '{}' não existe em {}", key, R::KIND))?;
        self.find_matching(Predicate::Eq(column, Cell::Text(value.to_string())))
            .await
    }

    /// Quantos registros casam com o predicado (ex: público de uma campanha)
    pub async fn count_matching(&self, predicate: &Predicate) -> Result<i64, AppError> {
        self.records.count(predicate).await
    }

    /// Todos os registros que casam com o predicado, na ordenação padrão
    async fn find_matching(&self, predicate: Predicate) -> Result<Vec<R>, AppError> {
        self.records
            .find_many(&RecordQuery {
                predicate,
                sort: self.default_sort(),
                descending: false,
                limit: None,
                offset: 0,
            })
            .await
    }

    /// Listagem paginada (ou completa com `all=true`) com busca, filtros exatos e regras.
    pub async fn list(&self, params: &ListParams) -> Result<Paginated<R>, AppError> {
        let predicate = build_predicate(R::KIND, params);
        let page = params.page.max(1);
        // Página absurda satura: OFFSET além do fim devolve página vazia
        let offset = (page - 1).saturating_mul(self.rows_per_page);

        let query = RecordQuery {
            sort: self.sort_column(params.sort_by.as_deref()),
            descending: params.descending,
            limit: (!params.all).then_some(self.rows_per_page),
            offset: if params.all { 0 } else { offset },
            predicate,
        };

        let data = self.records.find_many(&query).await?;
        let total = self.records.count(&query.predicate).await?;

        Ok(Paginated {
            data,
            total,
            page,
            total_pages: (total + self.rows_per_page - 1) / self.rows_per_page,
        })
    }

    // --- Helpers ---

    fn label(&self) -> &'static str {
        match R::KIND {
            EntityKind::Account => "Conta",
            EntityKind::Contact => "Contato",
        }
    }

    fn default_sort(&self) -> &'static Column {
        self.sort_column(None)
    }

    /// `sortBy` só vale se estiver no catálogo; senão cai na ordenação padrão
    fn sort_column(&self, requested: Option<&str>) -> &'static Column {
        if let Some(key) = requested {
            if let Some(column) = R::KIND.column(key) {
                return column;
            }
            tracing::warn!("Ordenação por '{}' ignorada em {}", key, R::KIND);
        }
        let fallback = R::KIND.default_sort();
        R::KIND
            .column(fallback)
            .unwrap_or(&R::KIND.columns()[0])
    }
}

/// "ACC" + milissegundos + 5 caracteres aleatórios
pub fn generate_id(kind: EntityKind) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", kind.id_prefix(), Utc::now().timestamp_millis(), &suffix[..5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::{MemoryFieldStore, MemoryRecordStore};
    use crate::models::{
        account::{Account, AccountDraft},
        contact::{Contact, ContactDraft},
        fields::{CreateFieldPayload, FieldType},
    };
    use serde_json::json;

    fn services() -> (RecordService<Account>, RecordService<Contact>) {
        let fields = FieldService::new(Arc::new(MemoryFieldStore::new()));
        (
            RecordService::new(Arc::new(MemoryRecordStore::<Account>::new()), fields.clone(), 2),
            RecordService::new(Arc::new(MemoryRecordStore::<Contact>::new()), fields, 2),
        )
    }

    fn account(name: &str, status: Option<&str>) -> AccountDraft {
        AccountDraft {
            name: name.to_string(),
            account_status: status.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn generated_ids_carry_the_entity_prefix() {
        let id = generate_id(EntityKind::Contact);
        assert!(id.starts_with("CON"));
        assert_eq!(id.len(), 3 + 13 + 5);
        assert_ne!(generate_id(EntityKind::Contact), id);
    }

    #[tokio::test]
    async fn create_validates_and_assigns_ids() {
        let (accounts, _) = services();

        let created = accounts.create(account("Acme", None)).await.unwrap();
        assert!(created.id.starts_with("ACC"));
        assert_eq!(created.created_date, created.last_modified_date);

        let mut with_id = account("Globex", None);
        with_id.id = Some("ACC-LEGACY-1".into());
        assert_eq!(accounts.create(with_id.clone()).await.unwrap().id, "ACC-LEGACY-1");
        assert!(matches!(
            accounts.create(with_id).await,
            Err(AppError::RecordAlreadyExists(_))
        ));

        assert!(matches!(
            accounts.create(account("", None)).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn list_paginates_sorts_and_filters() {
        let (accounts, _) = services();
        for (name, status) in [("Delta", Some("Active")), ("Alpha", Some("Active")), ("Charlie", None), ("Bravo", Some("Former"))] {
            accounts.create(account(name, status)).await.unwrap();
        }

        let page_two = accounts
            .list(&ListParams { page: 2, ..Default::default() })
            .await
            .unwrap();
        let names: Vec<_> = page_two.data.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Delta"]);
        assert_eq!((page_two.total, page_two.total_pages), (4, 2));

        let active_desc = accounts
            .list(&ListParams {
                page: 1,
                sort_by: Some("name".into()),
                descending: true,
                exact: vec![("accountStatus".into(), "Active".into())],
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = active_desc.data.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Delta", "Alpha"]);

        let everything = accounts
            .list(&ListParams {
                page: 1,
                all: true,
                sort_by: Some("not_a_column; DROP".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(everything.data.len(), 4);
        assert_eq!(everything.data[0].name, "Alpha");
    }

    #[tokio::test]
    async fn huge_page_number_yields_empty_page() {
        let (accounts, _) = services();
        accounts.create(account("Acme", None)).await.unwrap();

        let query = HashMap::from([("page".to_string(), i64::MAX.to_string())]);
        let params = ListParams::from_query(EntityKind::Account, &query);
        let page = accounts.list(&params).await.unwrap();

        assert!(page.data.is_empty());
        assert_eq!((page.total, page.page, page.total_pages), (1, i64::MAX, 1));
    }

    #[tokio::test]
    async fn find_by_matches_a_single_column() {
        let (accounts, contacts) = services();
        let acme = accounts.create(account("Acme", None)).await.unwrap();
        for (first, account_id) in [("Ana", Some(acme.id.clone())), ("Bia", None), ("Caio", Some(acme.id.clone()))] {
            contacts
                .create(ContactDraft {
                    first_name: first.into(),
                    last_name: "Lima".into(),
                    email: format!("{}@lima.com", first.to_lowercase()),
                    account_id,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let related = contacts.find_by("accountId", &acme.id).await.unwrap();
        let mut names: Vec<_> = related.iter().map(|c| c.first_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Ana", "Caio"]);

        assert!(matches!(
            contacts.find_by("nope", "x").await,
            Err(AppError::InternalServerError(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_columns_and_saves_custom_values() {
        let (accounts, _) = services();
        let created = accounts.create(account("Acme", Some("Active"))).await.unwrap();
        let region = accounts
            .fields()
            .create_field(CreateFieldPayload {
                entity: Some("account".into()),
                label: Some("Region".into()),
                field_type: Some(FieldType::Text),
                options_json: None,
                is_required: false,
                show_in_table: true,
            })
            .await
            .unwrap();

        let updated = accounts
            .update(
                &created.id,
                account("Acme Corp", None),
                &HashMap::from([(region.id, json!("South"))]),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Acme Corp");
        assert_eq!(updated.account_status, None);
        assert_eq!(updated.created_date, created.created_date);
        assert!(updated.last_modified_date >= created.last_modified_date);

        let (_, custom) = accounts.detail(&created.id).await.unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].value_text.as_deref(), Some("South"));

        let missing = accounts.update("ACC-NOPE", account("X", None), &HashMap::new()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_record_and_custom_values() {
        let (_, contacts) = services();
        let contact = contacts
            .create(ContactDraft {
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                email: "ana@lima.com".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let vip = contacts
            .fields()
            .create_field(CreateFieldPayload {
                entity: Some("contact".into()),
                label: Some("VIP".into()),
                field_type: Some(FieldType::Boolean),
                options_json: None,
                is_required: false,
                show_in_table: false,
            })
            .await
            .unwrap();
        contacts
            .fields()
            .set_values(EntityKind::Contact, &contact.id, &HashMap::from([(vip.id, json!(true))]))
            .await
            .unwrap();

        contacts.delete(&contact.id).await.unwrap();

        assert!(matches!(contacts.find(&contact.id).await, Err(AppError::NotFound(_))));
        assert!(contacts.fields().get_values(EntityKind::Contact, &contact.id).await.unwrap().is_empty());
        assert!(matches!(contacts.delete(&contact.id).await, Err(AppError::NotFound(_))));
    }
}

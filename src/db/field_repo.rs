// src/db/field_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    db::FieldStore,
    models::{
        entity::EntityKind,
        fields::{FieldDefinition, FieldValue, NewFieldDefinition, NewFieldValue},
    },
};

#[derive(Clone)]
pub struct FieldRepository {
    pool: PgPool,
}

impl FieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FieldStore for FieldRepository {
    // =========================================================================
    //  DEFINIÇÕES DE CAMPOS (O Molde)
    // =========================================================================

    async fn insert_definition(&self, new: &NewFieldDefinition) -> Result<FieldDefinition, AppError> {
        let definition = sqlx::query_as::<_, FieldDefinition>(
            r#"
            INSERT INTO crm_field_definitions (
                entity, field_key, label, field_type, options_json,
                is_required, show_in_table, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.entity)
        .bind(&new.field_key)
        .bind(&new.label)
        .bind(new.field_type)
        .bind(&new.options_json)
        .bind(new.is_required)
        .bind(new.show_in_table)
        .bind(new.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Duas requisições com o mesmo label podem passar pela checagem do service
            map_unique_violation(e, || {
                AppError::DuplicateField(format!(
                    "Já existe um campo com a chave '{}' em {}",
                    new.field_key, new.entity
                ))
            })
        })?;

        Ok(definition)
    }

    async fn find_definition(&self, id: i64) -> Result<Option<FieldDefinition>, AppError> {
        let definition = sqlx::query_as::<_, FieldDefinition>(
            "SELECT * FROM crm_field_definitions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(definition)
    }

    async fn find_definition_by_key(
        &self,
        entity: EntityKind,
        field_key: &str,
    ) -> Result<Option<FieldDefinition>, AppError> {
        let definition = sqlx::query_as::<_, FieldDefinition>(
            "SELECT * FROM crm_field_definitions WHERE entity = $1 AND field_key = $2",
        )
        .bind(entity)
        .bind(field_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(definition)
    }

    async fn list_definitions(&self, entity: EntityKind) -> Result<Vec<FieldDefinition>, AppError> {
        let definitions = sqlx::query_as::<_, FieldDefinition>(
            r#"
            SELECT * FROM crm_field_definitions
            WHERE entity = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(entity)
        .fetch_all(&self.pool)
        .await?;

        Ok(definitions)
    }

    async fn max_sort_order(&self, entity: EntityKind) -> Result<Option<i32>, AppError> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(sort_order) FROM crm_field_definitions WHERE entity = $1",
        )
        .bind(entity)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn update_definition(&self, definition: &FieldDefinition) -> Result<Option<FieldDefinition>, AppError> {
        // entity e field_key ficam de fora: são imutáveis depois de criados
        let updated = sqlx::query_as::<_, FieldDefinition>(
            r#"
            UPDATE crm_field_definitions
            SET label = $2, options_json = $3, is_required = $4,
                show_in_table = $5, sort_order = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(definition.id)
        .bind(&definition.label)
        .bind(&definition.options_json)
        .bind(definition.is_required)
        .bind(definition.show_in_table)
        .bind(definition.sort_order)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_definition(&self, id: i64) -> Result<u64, AppError> {
        // Valores e definição somem juntos ou nenhum some
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM crm_field_values WHERE field_definition_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM crm_field_definitions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }

    // =========================================================================
    //  VALORES (O Dado)
    // =========================================================================

    async fn upsert_value(&self, value: &NewFieldValue) -> Result<FieldValue, AppError> {
        let stored = sqlx::query_as::<_, FieldValue>(
            r#"
            INSERT INTO crm_field_values (
                field_definition_id, entity, record_id,
                value_text, value_number, value_boolean
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (field_definition_id, record_id) DO UPDATE
            SET value_text = EXCLUDED.value_text,
                value_number = EXCLUDED.value_number,
                value_boolean = EXCLUDED.value_boolean,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(value.field_definition_id)
        .bind(value.entity)
        .bind(&value.record_id)
        .bind(&value.value_text)
        .bind(value.value_number)
        .bind(value.value_boolean)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_values(&self, entity: EntityKind, record_id: &str) -> Result<Vec<FieldValue>, AppError> {
        let values = sqlx::query_as::<_, FieldValue>(
            "SELECT * FROM crm_field_values WHERE entity = $1 AND record_id = $2 ORDER BY id",
        )
        .bind(entity)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn list_values_for_records(
        &self,
        entity: EntityKind,
        record_ids: &[String],
    ) -> Result<Vec<FieldValue>, AppError> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let values = sqlx::query_as::<_, FieldValue>(
            "SELECT * FROM crm_field_values WHERE entity = $1 AND record_id = ANY($2)",
        )
        .bind(entity)
        .bind(record_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn count_values(&self, field_definition_id: i64) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM crm_field_values WHERE field_definition_id = $1",
        )
        .bind(field_definition_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn delete_values_for_record(&self, entity: EntityKind, record_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM crm_field_values WHERE entity = $1 AND record_id = $2")
            .bind(entity)
            .bind(record_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

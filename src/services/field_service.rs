// src/services/field_service.rs

use std::{borrow::Cow, collections::HashMap, sync::Arc};

use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::FieldStore,
    models::{
        entity::{parse_bool, EntityKind},
        fields::{
            CreateFieldPayload, CustomFieldEntry, FieldDefinition, FieldType, FieldTypeOption,
            FieldValue, NewFieldDefinition, NewFieldValue, UpdateFieldPayload, ValueSlot,
        },
    },
};

/// Registry de definições + store de valores dos campos customizados.
#[derive(Clone)]
pub struct FieldService {
    store: Arc<dyn FieldStore>,
}

impl FieldService {
    pub fn new(store: Arc<dyn FieldStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  1. CATÁLOGO DE TIPOS
    // =========================================================================

    pub fn field_types(&self) -> Vec<FieldTypeOption> {
        FieldType::ALL
            .iter()
            .map(|t| FieldTypeOption {
                value: *t,
                label: t.label().to_string(),
            })
            .collect()
    }

    // =========================================================================
    //  2. DEFINIÇÕES (O Molde)
    // =========================================================================

    pub async fn create_field(&self, payload: CreateFieldPayload) -> Result<FieldDefinition, AppError> {
        let entity = match payload.entity.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => EntityKind::parse(raw)
                .ok_or_else(|| AppError::InvalidInput(format!("Entidade desconhecida: '{}'", raw)))?,
            None => return Err(required("entity", "A entidade é obrigatória.")),
        };

        let label = payload.label.as_deref().map(str::trim).unwrap_or_default();
        if label.is_empty() {
            return Err(required("label", "O label é obrigatório."));
        }
        let Some(field_type) = payload.field_type else {
            return Err(required("fieldType", "O tipo do campo é obrigatório."));
        };

        let slug = slugify(label);
        if slug.is_empty() {
            return Err(required("label", "O label precisa ter letras ou dígitos."));
        }
        let field_key = format!("custom_{}", slug);

        // Só dropdown guarda opções
        let options_json = match field_type {
            FieldType::Dropdown => Some(encode_options(payload.options_json.as_ref())?),
            _ => None,
        };

        if self.store.find_definition_by_key(entity, &field_key).await?.is_some() {
            return Err(AppError::DuplicateField(format!(
                "Já existe um campo com a chave '{}' em {}",
                field_key, entity
            )));
        }

        let sort_order = self.store.max_sort_order(entity).await?.unwrap_or(0) + 1;

        let definition = self
            .store
            .insert_definition(&NewFieldDefinition {
                entity,
                field_key,
                label: label.to_string(),
                field_type,
                options_json,
                is_required: payload.is_required,
                show_in_table: payload.show_in_table,
                sort_order,
            })
            .await?;

        tracing::info!(
            "✅ Campo customizado '{}' ({:?}) criado para {}",
            definition.field_key,
            definition.field_type,
            entity
        );
        Ok(definition)
    }

    pub async fn list_fields(&self, entity: EntityKind) -> Result<Vec<FieldDefinition>, AppError> {
        self.store.list_definitions(entity).await
    }

    pub async fn update_field(&self, id: i64, patch: UpdateFieldPayload) -> Result<FieldDefinition, AppError> {
        let mut definition = self
            .store
            .find_definition(id)
            .await?
            .ok_or_else(|| AppError::not_found("Campo", id))?;

        if let Some(label) = patch.label {
            let label = label.trim();
            if label.is_empty() {
                return Err(required("label", "O label é obrigatório."));
            }
            // A chave não acompanha o label: continua a derivada na criação
            definition.label = label.to_string();
        }
        if let Some(options) = patch.options_json {
            if definition.field_type == FieldType::Dropdown {
                definition.options_json = Some(encode_options(Some(&options))?);
            }
        }
        if let Some(is_required) = patch.is_required {
            definition.is_required = is_required;
        }
        if let Some(show_in_table) = patch.show_in_table {
            definition.show_in_table = show_in_table;
        }
        if let Some(sort_order) = patch.sort_order {
            definition.sort_order = sort_order;
        }

        self.store
            .update_definition(&definition)
            .await?
            .ok_or_else(|| AppError::not_found("Campo", id))
    }

    /// Remove a definição e todos os valores dela. Irreversível; a confirmação é do cliente.
    pub async fn delete_field(&self, id: i64) -> Result<u64, AppError> {
        let definition = self
            .store
            .find_definition(id)
            .await?
            .ok_or_else(|| AppError::not_found("Campo", id))?;

        let removed = self.store.delete_definition(id).await?;
        tracing::warn!(
            "🗑️ Campo '{}' de {} removido junto com {} valores",
            definition.field_key,
            definition.entity,
            removed
        );
        Ok(removed)
    }

    // =========================================================================
    //  3. VALORES (O Dado)
    // =========================================================================

    /// Valores gravados de um registro, cada um com sua definição.
    /// Definições sem valor não aparecem.
    pub async fn get_values(&self, entity: EntityKind, record_id: &str) -> Result<Vec<CustomFieldEntry>, AppError> {
        let definitions: HashMap<i64, FieldDefinition> = self
            .store
            .list_definitions(entity)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let mut entries: Vec<CustomFieldEntry> = self
            .store
            .list_values(entity, record_id)
            .await?
            .into_iter()
            .filter_map(|value| {
                let definition = definitions.get(&value.field_definition_id)?.clone();
                Some(CustomFieldEntry::new(value, definition))
            })
            .collect();

        entries.sort_by_key(|e| (e.field_definition.sort_order, e.field_definition.id));
        Ok(entries)
    }

    /// Upsert de cada valor conforme o tipo declarado. IDs desconhecidos (ou de
    /// outra entidade) são ignorados.
    pub async fn set_values(
        &self,
        entity: EntityKind,
        record_id: &str,
        values: &HashMap<i64, Value>,
    ) -> Result<Vec<FieldValue>, AppError> {
        let mut field_ids: Vec<&i64> = values.keys().collect();
        field_ids.sort();

        let mut stored = Vec::with_capacity(field_ids.len());
        for field_id in field_ids {
            let Some(definition) = self.store.find_definition(*field_id).await? else {
                tracing::debug!("Valor ignorado: campo {} não existe", field_id);
                continue;
            };
            if definition.entity != entity {
                tracing::debug!("Valor ignorado: campo {} pertence a {}", field_id, definition.entity);
                continue;
            }

            let new_value = coerce_value(&definition, entity, record_id, &values[field_id]);
            stored.push(self.store.upsert_value(&new_value).await?);
        }

        Ok(stored)
    }

    /// Valores de vários registros de uma vez (export), agrupados por registro.
    pub async fn values_by_record(
        &self,
        entity: EntityKind,
        record_ids: &[String],
    ) -> Result<HashMap<String, Vec<FieldValue>>, AppError> {
        let mut grouped: HashMap<String, Vec<FieldValue>> = HashMap::new();
        for value in self.store.list_values_for_records(entity, record_ids).await? {
            grouped.entry(value.record_id.clone()).or_default().push(value);
        }
        Ok(grouped)
    }

    pub async fn delete_values_for_record(&self, entity: EntityKind, record_id: &str) -> Result<u64, AppError> {
        self.store.delete_values_for_record(entity, record_id).await
    }
}

// --- Helpers ---

fn required(field: &'static str, message: &'static str) -> AppError {
    let mut error = ValidationError::new("required");
    error.message = Some(Cow::Borrowed(message));

    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::ValidationError(errors)
}

/// "Shirt Size (EU)" -> "shirt_size_eu"
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Opções de dropdown: array JSON de strings, ou uma string contendo esse array.
fn encode_options(raw: Option<&Value>) -> Result<String, AppError> {
    let invalid = || AppError::InvalidInput("As opções do dropdown devem ser uma lista de textos.".to_string());

    let parsed: Value = match raw {
        Some(Value::String(s)) => serde_json::from_str(s).map_err(|_| invalid())?,
        Some(other) => other.clone(),
        None => return Err(invalid()),
    };

    let options: Vec<String> = serde_json::from_value(parsed).map_err(|_| invalid())?;
    let options: Vec<String> = options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if options.is_empty() {
        return Err(invalid());
    }

    serde_json::to_string(&options).map_err(|e| AppError::InternalServerError(e.into()))
}

/// Verdadeiro/falso no estilo de formulário: vazio, 0 e "false" contam como falso.
fn is_truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && parse_bool(trimmed) != Some(false)
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Lê o maior prefixo numérico ("12.5kg" -> 12.5). Sem dígitos = None.
fn parse_number_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        let frac_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        digits += end - frac_start;
    }
    if digits == 0 {
        return None;
    }

    // Expoente só conta se tiver dígitos
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

fn coerce_value(definition: &FieldDefinition, entity: EntityKind, record_id: &str, raw: &Value) -> NewFieldValue {
    let mut value = NewFieldValue {
        field_definition_id: definition.id,
        entity,
        record_id: record_id.to_string(),
        value_text: None,
        value_number: None,
        value_boolean: None,
    };

    match definition.field_type.storage() {
        ValueSlot::Boolean => value.value_boolean = Some(i32::from(is_truthy(raw))),
        ValueSlot::Number => {
            // Zero numérico é falsy e vira NULL; a string "0" não
            value.value_number = match raw {
                Value::Number(n) => n.as_f64().filter(|f| *f != 0.0 && !f.is_nan()),
                Value::String(s) => parse_number_prefix(s),
                _ => None,
            }
        }
        ValueSlot::Text => {
            value.value_text = match raw {
                Value::Null | Value::Bool(false) => None,
                Value::Number(n) if n.as_f64() == Some(0.0) => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        }
    }

    value
}

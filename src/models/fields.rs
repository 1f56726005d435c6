// src/models/fields.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::models::entity::EntityKind;

// --- ENUMS ---

// Mapeia o CREATE TYPE crm_field_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "crm_field_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
    Dropdown,
    Url,
    Email,
    Phone,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Dropdown,
        FieldType::Url,
        FieldType::Email,
        FieldType::Phone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Integer => "Integer",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Datetime => "Date & Time",
            FieldType::Dropdown => "Dropdown",
            FieldType::Url => "URL",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
        }
    }

    /// Qual coluna tipada de `crm_field_values` guarda o valor
    pub fn storage(&self) -> ValueSlot {
        match self {
            FieldType::Boolean => ValueSlot::Boolean,
            FieldType::Number | FieldType::Integer => ValueSlot::Number,
            _ => ValueSlot::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot {
    Text,
    Number,
    Boolean,
}

/// Item do catálogo de tipos (para montar o select da tela de configuração)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldTypeOption {
    pub value: FieldType,
    pub label: String,
}

// --- DEFINIÇÕES (O Molde) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[schema(example = 1)]
    pub id: i64,
    pub entity: EntityKind,
    #[schema(example = "custom_shirt_size")]
    pub field_key: String,
    #[schema(example = "Shirt Size")]
    pub label: String,
    pub field_type: FieldType,
    // Lista de opções serializada (só para dropdown). Ex: "[\"P\",\"M\",\"G\"]"
    pub options_json: Option<String>,
    pub is_required: bool,
    pub show_in_table: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Dados de inserção; a chave já vem derivada pelo registry
#[derive(Debug, Clone)]
pub struct NewFieldDefinition {
    pub entity: EntityKind,
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    pub options_json: Option<String>,
    pub is_required: bool,
    pub show_in_table: bool,
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldPayload {
    #[schema(example = "account")]
    pub entity: Option<String>,

    #[schema(example = "Shirt Size")]
    pub label: Option<String>,

    #[schema(example = "dropdown")]
    pub field_type: Option<FieldType>,

    // Aceita um array JSON ou uma string contendo um array JSON
    #[schema(example = json!(["P", "M", "G"]))]
    pub options_json: Option<Value>,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub show_in_table: bool,
}

// `fieldKey` e `entity` não mudam depois da criação
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldPayload {
    pub label: Option<String>,
    pub options_json: Option<Value>,
    pub is_required: Option<bool>,
    pub show_in_table: Option<bool>,
    pub sort_order: Option<i32>,
}

// --- VALORES (O Dado) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub id: i64,
    pub field_definition_id: i64,
    pub entity: EntityKind,
    pub record_id: String,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    // 0 ou 1
    pub value_boolean: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl FieldValue {
    /// Texto exibido para o valor conforme o tipo declarado
    pub fn render(&self, field_type: FieldType) -> String {
        match field_type.storage() {
            ValueSlot::Boolean => match self.value_boolean {
                Some(1) => "Yes".to_string(),
                Some(_) => "No".to_string(),
                None => String::new(),
            },
            ValueSlot::Number => self.value_number.map(|n| n.to_string()).unwrap_or_default(),
            ValueSlot::Text => self.value_text.clone().unwrap_or_default(),
        }
    }
}

/// Valor já normalizado, pronto para o upsert
#[derive(Debug, Clone, PartialEq)]
pub struct NewFieldValue {
    pub field_definition_id: i64,
    pub entity: EntityKind,
    pub record_id: String,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    pub value_boolean: Option<i32>,
}

/// Valor + definição, como aparece em `customFields` no detalhe do registro
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldEntry {
    pub id: i64,
    pub value_text: Option<String>,
    pub value_number: Option<f64>,
    pub value_boolean: Option<i32>,
    pub updated_at: DateTime<Utc>,
    pub display: String,
    pub field_definition: FieldDefinition,
}

impl CustomFieldEntry {
    pub fn new(value: FieldValue, definition: FieldDefinition) -> Self {
        Self {
            id: value.id,
            display: value.render(definition.field_type),
            value_text: value.value_text,
            value_number: value.value_number,
            value_boolean: value.value_boolean,
            updated_at: value.updated_at,
            field_definition: definition,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetFieldValuesPayload {
    #[schema(example = "account")]
    pub entity: String,
    #[schema(example = "ACC1718900000000x7k2p")]
    pub record_id: String,
    // fieldDefinitionId -> valor cru vindo do formulário
    #[serde(alias = "valuesByFieldId")]
    #[schema(example = json!({"1": "M", "2": true}))]
    pub values: HashMap<i64, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: Option<&str>, number: Option<f64>, boolean: Option<i32>) -> FieldValue {
        FieldValue {
            id: 1,
            field_definition_id: 1,
            entity: EntityKind::Account,
            record_id: "ACC1".into(),
            value_text: text.map(str::to_string),
            value_number: number,
            value_boolean: boolean,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn render_follows_declared_type() {
        assert_eq!(value(None, None, Some(1)).render(FieldType::Boolean), "Yes");
        assert_eq!(value(None, None, Some(0)).render(FieldType::Boolean), "No");
        assert_eq!(value(None, Some(3.0), None).render(FieldType::Integer), "3");
        assert_eq!(value(None, Some(2.5), None).render(FieldType::Number), "2.5");
        assert_eq!(value(Some("M"), None, None).render(FieldType::Dropdown), "M");
        assert_eq!(value(None, None, None).render(FieldType::Url), "");
    }

    #[test]
    fn field_type_wire_names_are_lowercase() {
        let parsed: FieldType = serde_json::from_str("\"datetime\"").unwrap();
        assert_eq!(parsed, FieldType::Datetime);
        assert_eq!(serde_json::to_string(&FieldType::Url).unwrap(), "\"url\"");
    }
}

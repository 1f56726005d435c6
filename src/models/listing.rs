// src/models/listing.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{entity::EntityKind, fields::CustomFieldEntry};

// --- ENTRADA: parâmetros de listagem/exportação ---

/// Parâmetros crus da query string de listagem. A conversão para predicado
/// acontece no compilador de filtros.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: i64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub descending: bool,
    pub all: bool,
    // JSON serializado: [{ "field": "...", "operator": "...", "value": "..." }]
    pub filters: Option<String>,
    // Filtros de valor único (accountStatus=Active, ...)
    pub exact: Vec<(String, String)>,
    // Só usado pelo export: chaves das colunas visíveis, separadas por vírgula
    pub columns: Vec<String>,
}

impl ListParams {
    pub fn from_query(kind: EntityKind, query: &HashMap<String, String>) -> Self {
        let non_empty = |key: &str| {
            query
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let exact = kind
            .exact_filters()
            .iter()
            .filter_map(|key| non_empty(key).map(|v| (key.to_string(), v)))
            .collect();

        let columns = non_empty("columns")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            page: non_empty("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1),
            search: non_empty("search"),
            sort_by: non_empty("sortBy"),
            descending: non_empty("sortDir").is_some_and(|d| d.eq_ignore_ascii_case("desc")),
            all: non_empty("all").is_some_and(|a| a == "true"),
            filters: non_empty("filters"),
            exact,
            columns,
        }
    }
}

// --- SAÍDA ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<R> {
    pub data: Vec<R>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Registro base + valores customizados + relações (`X`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetail<R, X> {
    #[serde(flatten)]
    pub record: R,
    pub custom_fields: Vec<CustomFieldEntry>,
    #[serde(flatten)]
    pub extra: X,
}

/// Corpo do PUT: colunas base + `customFieldValues` opcional
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate<D> {
    #[serde(flatten)]
    pub draft: D,
    // Chaves como string: com `flatten` o serde não converte "12" -> i64
    #[serde(default)]
    pub custom_field_values: Option<HashMap<String, Value>>,
}

impl<D> RecordUpdate<D> {
    /// IDs não numéricos são descartados (estado velho do cliente)
    pub fn values_by_field_id(&self) -> HashMap<i64, Value> {
        self.custom_field_values
            .iter()
            .flatten()
            .filter_map(|(k, v)| k.trim().parse::<i64>().ok().map(|id| (id, v.clone())))
            .collect()
    }
}

// --- IMPORT / EXPORT ---

/// Um campo-alvo possível para uma coluna do CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MappingTarget {
    #[schema(example = "firstName")]
    pub value: String,
    #[schema(example = "First Name")]
    pub label: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportPreviewRequest {
    pub csv: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub targets: Vec<MappingTarget>,
    // Sugestão por índice de coluna; null = "skip"
    pub mapping: Vec<Option<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub csv: String,
    // Mapeamento confirmado pelo usuário; ausente = usa o automático
    #[serde(default)]
    pub mapping: Option<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOutcome {
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported_count: usize,
    pub failed_count: usize,
    #[schema(example = "Imported 2 accounts, 1 failed")]
    pub message: String,
}

impl ImportSummary {
    pub fn new(kind: EntityKind, outcome: ImportOutcome) -> Self {
        let noun = if outcome.success == 1 {
            kind.as_str().to_string()
        } else {
            format!("{}s", kind.as_str())
        };
        let message = if outcome.failed > 0 {
            format!("Imported {} {}, {} failed", outcome.success, noun, outcome.failed)
        } else {
            format!("Imported {} {}", outcome.success, noun)
        };
        Self {
            imported_count: outcome.success,
            failed_count: outcome.failed,
            message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

// src/services/filter.rs

use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    entity::{Cell, Column, ColumnKind, CrmRecord, EntityKind},
    listing::ListParams,
};

// --- REGRAS (entrada do cliente) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Contains,
    Equals,
    NotEquals,
    IsEmpty,
    IsNotEmpty,
    // Operador desconhecido: a regra é ignorada, não o filtro inteiro
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub field: Option<String>,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl FilterRule {
    fn value_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// --- PREDICADO (saída) ---

/// Árvore de condições sobre colunas do catálogo. Valores nunca viram texto SQL:
/// o repositório traduz cada nó com `push_bind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    Eq(&'static Column, Cell),
    NotEq(&'static Column, Cell),
    Contains(&'static Column, String),
    IsNull(&'static Column),
    IsNotNull(&'static Column),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// AND que colapsa para `All` quando não sobra nenhuma condição
    pub fn and(mut conditions: Vec<Predicate>) -> Predicate {
        conditions.retain(|c| *c != Predicate::All);
        match conditions.len() {
            0 => Predicate::All,
            1 => conditions.remove(0),
            _ => Predicate::And(conditions),
        }
    }

    /// Avaliação em memória com a mesma semântica do SQL gerado (NULL nunca
    /// satisfaz igualdade, desigualdade nem substring).
    pub fn matches<R: CrmRecord>(&self, record: &R) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq(col, expected) => record.cell(col.key).loosely_eq(expected),
            Predicate::NotEq(col, expected) => {
                let cell = record.cell(col.key);
                !cell.is_null() && !cell.loosely_eq(expected)
            }
            Predicate::Contains(col, needle) => {
                let cell = record.cell(col.key);
                !cell.is_null() && cell.as_text().contains(needle.as_str())
            }
            Predicate::IsNull(col) => record.cell(col.key).is_null(),
            Predicate::IsNotNull(col) => !record.cell(col.key).is_null(),
            Predicate::And(items) => items.iter().all(|p| p.matches(record)),
            Predicate::Or(items) => items.iter().any(|p| p.matches(record)),
        }
    }
}

/// Filtro exato da query string: flags booleanas só são verdadeiras com "true".
fn exact_value(column: &Column, raw: &str) -> Cell {
    match column.kind {
        ColumnKind::Boolean => Cell::Boolean(raw == "true"),
        _ => typed_value(column, raw),
    }
}

/// Valor tipado para igualdade; se não converter, compara pelo texto.
fn typed_value(column: &Column, raw: &str) -> Cell {
    Cell::parse(column.kind, raw).unwrap_or_else(|| Cell::Text(raw.to_string()))
}

// =============================================================================
//  COMPILADOR
// =============================================================================

/// Lê a lista serializada de regras. JSON inválido = sem filtro (falha aberta).
pub fn parse_rules(raw: &str) -> Vec<FilterRule> {
    match serde_json::from_str::<Vec<FilterRule>>(raw) {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!("⚠️ Filtro ignorado, JSON inválido ({}): {}", e, raw);
            Vec::new()
        }
    }
}

/// Traduz as regras para um predicado AND sobre as colunas base da entidade.
pub fn compile(kind: EntityKind, rules: &[FilterRule]) -> Predicate {
    let mut conditions = Vec::new();

    for rule in rules {
        let Some(field) = rule.field.as_deref().map(str::trim).filter(|f| !f.is_empty()) else {
            continue;
        };

        // Campos customizados e nomes fora do catálogo não são filtráveis
        let Some(column) = kind.column(field) else {
            tracing::warn!("Regra de filtro ignorada: campo '{}' não existe em {}", field, kind);
            continue;
        };

        let condition = match rule.operator {
            FilterOperator::Contains => Predicate::Contains(column, rule.value_text()),
            FilterOperator::Equals => Predicate::Eq(column, typed_value(column, &rule.value_text())),
            FilterOperator::NotEquals => {
                Predicate::NotEq(column, typed_value(column, &rule.value_text()))
            }
            FilterOperator::IsEmpty => Predicate::IsNull(column),
            FilterOperator::IsNotEmpty => Predicate::IsNotNull(column),
            FilterOperator::Unsupported => continue,
        };
        conditions.push(condition);
    }

    Predicate::and(conditions)
}

/// Busca livre (OR entre colunas fixas) AND filtros exatos AND regras.
pub fn build_predicate(kind: EntityKind, params: &ListParams) -> Predicate {
    let mut conditions = Vec::new();

    if let Some(search) = params.search.as_deref() {
        let any_column = kind
            .search_columns()
            .iter()
            .filter_map(|key| kind.column(key))
            .map(|col| Predicate::Contains(col, search.to_string()))
            .collect();
        conditions.push(Predicate::Or(any_column));
    }

    for (key, value) in &params.exact {
        if let Some(column) = kind.column(key) {
            conditions.push(Predicate::Eq(column, exact_value(column, value)));
        }
    }

    if let Some(raw) = params.filters.as_deref() {
        conditions.push(compile(kind, &parse_rules(raw)));
    }

    Predicate::and(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        account::{Account, AccountDraft},
        contact::{Contact, ContactDraft},
    };
    use chrono::Utc;

    fn account(name: &str, status: Option<&str>) -> Account {
        Account::from_draft(
            format!("ACC-{name}"),
            AccountDraft {
                name: name.to_string(),
                account_status: status.map(str::to_string),
                industry: Some("Retail".into()),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn rules(json: &str) -> Vec<FilterRule> {
        parse_rules(json)
    }

    #[test]
    fn contains_and_not_empty_are_anded() {
        let predicate = compile(
            EntityKind::Account,
            &rules(
                r#"[{"field":"name","operator":"contains","value":"Acme"},
                    {"field":"accountStatus","operator":"is_not_empty"}]"#,
            ),
        );

        assert!(predicate.matches(&account("Acme Corp", Some("Active"))));
        assert!(!predicate.matches(&account("Other Co", Some("Active"))));
        assert!(!predicate.matches(&account("Acme Corp", None)));
    }

    #[test]
    fn equals_and_not_equals_are_exact() {
        let eq = compile(
            EntityKind::Account,
            &rules(r#"[{"field":"accountStatus","operator":"equals","value":"Active"}]"#),
        );
        assert!(eq.matches(&account("A", Some("Active"))));
        assert!(!eq.matches(&account("A", Some("active"))));

        let ne = compile(
            EntityKind::Account,
            &rules(r#"[{"field":"accountStatus","operator":"not_equals","value":"Active"}]"#),
        );
        assert!(ne.matches(&account("A", Some("Prospect"))));
        assert!(!ne.matches(&account("A", Some("Active"))));
        // NULL não é "diferente de" nada, igual ao SQL
        assert!(!ne.matches(&account("A", None)));
    }

    #[test]
    fn is_empty_ignores_value() {
        let predicate = compile(
            EntityKind::Account,
            &rules(r#"[{"field":"accountStatus","operator":"is_empty","value":"whatever"}]"#),
        );
        assert_eq!(predicate, Predicate::IsNull(EntityKind::Account.column("accountStatus").unwrap()));
        assert!(predicate.matches(&account("A", None)));
    }

    #[test]
    fn empty_fields_unknown_fields_and_operators_are_skipped() {
        let predicate = compile(
            EntityKind::Account,
            &rules(
                r#"[{"field":"","operator":"equals","value":"x"},
                    {"operator":"equals","value":"x"},
                    {"field":"custom_shirt_size","operator":"equals","value":"M"},
                    {"field":"name","operator":"starts_with","value":"A"}]"#,
            ),
        );
        assert_eq!(predicate, Predicate::All);
    }

    #[test]
    fn malformed_json_means_no_filter() {
        assert!(parse_rules("not json").is_empty());
        assert!(parse_rules(r#"{"field":"name"}"#).is_empty());
        let params = ListParams {
            filters: Some("[{broken".into()),
            ..Default::default()
        };
        assert_eq!(build_predicate(EntityKind::Account, &params), Predicate::All);
    }

    #[test]
    fn boolean_equality_coerces_value() {
        let contact = Contact::from_draft(
            "CON1".into(),
            ContactDraft {
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                email: "ana@lima.com".into(),
                executive_or_not: true,
                ..Default::default()
            },
            Utc::now(),
        );
        let predicate = compile(
            EntityKind::Contact,
            &rules(r#"[{"field":"executiveOrNot","operator":"equals","value":true}]"#),
        );
        assert!(predicate.matches(&contact));
    }

    #[test]
    fn boolean_exact_filters_only_accept_literal_true() {
        let flag = EntityKind::Contact.column("executiveOrNot").unwrap();
        let params = |value: &str| ListParams {
            exact: vec![("executiveOrNot".into(), value.into())],
            ..Default::default()
        };

        assert_eq!(
            build_predicate(EntityKind::Contact, &params("true")),
            Predicate::Eq(flag, Cell::Boolean(true))
        );
        for value in ["yes", "1", "TRUE", "garbage"] {
            assert_eq!(
                build_predicate(EntityKind::Contact, &params(value)),
                Predicate::Eq(flag, Cell::Boolean(false)),
                "value {value}"
            );
        }
    }

    #[test]
    fn search_exact_filters_and_rules_combine_with_and() {
        let params = ListParams {
            search: Some("Acme".into()),
            exact: vec![("industry".into(), "Retail".into())],
            filters: Some(r#"[{"field":"accountStatus","operator":"equals","value":"Active"}]"#.into()),
            ..Default::default()
        };
        let predicate = build_predicate(EntityKind::Account, &params);

        assert!(matches!(&predicate, Predicate::And(items) if items.len() == 3));
        assert!(predicate.matches(&account("Acme Corp", Some("Active"))));
        assert!(!predicate.matches(&account("Acme Corp", Some("Former"))));
        assert!(!predicate.matches(&account("Globex", Some("Active"))));
    }
}

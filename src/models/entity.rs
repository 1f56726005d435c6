// src/models/entity.rs

use std::{cmp::Ordering, collections::HashMap, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use sqlx::{postgres::PgRow, FromRow};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{account::ACCOUNT_COLUMNS, contact::CONTACT_COLUMNS};

// --- ENUMS ---

// Mapeia o CREATE TYPE crm_entity do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "crm_entity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Account,
    Contact,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Contact => "contact",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "account" | "accounts" => Some(EntityKind::Account),
            "contact" | "contacts" => Some(EntityKind::Contact),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Contact => "contacts",
        }
    }

    /// Prefixo dos IDs gerados (Ex: "ACC1718900000000x7k2p")
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Account => "ACC",
            EntityKind::Contact => "CON",
        }
    }

    /// Catálogo fixo de colunas base. Nenhum nome de coluna fora daqui chega no SQL.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            EntityKind::Account => ACCOUNT_COLUMNS,
            EntityKind::Contact => CONTACT_COLUMNS,
        }
    }

    pub fn column(&self, key: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.key == key)
    }

    /// Colunas usadas pela busca livre (OR entre elas)
    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Account => &["name", "industry", "phone"],
            EntityKind::Contact => &["firstName", "lastName", "email", "title"],
        }
    }

    /// Filtros de valor único aceitos na query string (igualdade exata)
    pub fn exact_filters(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Account => &["accountStatus", "industry", "national", "target", "libPic"],
            EntityKind::Contact => &[
                "contactStatus",
                "personCountry",
                "executiveOrNot",
                "worthFollowing",
                "doNotSendWhitepaper",
                "hasOptedOutOfEmail",
            ],
        }
    }

    /// Campos sem os quais uma linha de importação nem é enviada ao create
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Account => &["name"],
            EntityKind::Contact => &["firstName", "lastName", "email"],
        }
    }

    pub fn default_sort(&self) -> &'static str {
        match self {
            EntityKind::Account => "name",
            EntityKind::Contact => "lastName",
        }
    }

    /// Colunas exportadas quando o cliente não informa nenhuma
    pub fn default_export_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Account => &[
                "name",
                "industry",
                "accountStatus",
                "phone",
                "website",
                "libPic",
                "createdDate",
            ],
            EntityKind::Contact => &[
                "firstName",
                "lastName",
                "email",
                "phone",
                "title",
                "contactStatus",
                "createdDate",
            ],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Decimal,
    Integer,
    Boolean,
    Date,
    Timestamp,
}

// --- CATÁLOGO ---

/// Uma coluna base: `key` é o nome no JSON/filtros, `db` o nome real na tabela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub db: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub importable: bool,
}

impl Column {
    pub const fn new(key: &'static str, db: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self { key, db, label, kind, importable: true }
    }

    pub const fn text(key: &'static str, db: &'static str, label: &'static str) -> Self {
        Self::new(key, db, label, ColumnKind::Text)
    }

    /// Colunas de sistema (datas de auditoria): filtráveis e exportáveis, nunca importadas
    pub const fn system(key: &'static str, db: &'static str, label: &'static str) -> Self {
        Self { key, db, label, kind: ColumnKind::Timestamp, importable: false }
    }
}

// --- VALOR DE CÉLULA ---

/// Valor tipado de uma coluna base, usado pelo filtro, pelos stores e pelo export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Decimal(Decimal),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Converte texto vindo do cliente para o tipo da coluna
    pub fn parse(kind: ColumnKind, raw: &str) -> Option<Cell> {
        let trimmed = raw.trim();
        match kind {
            ColumnKind::Text => Some(Cell::Text(raw.to_string())),
            ColumnKind::Decimal => Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
                .map(Cell::Decimal),
            ColumnKind::Integer => parse_integer(trimmed).map(Cell::Integer),
            ColumnKind::Boolean => parse_bool(trimmed).map(Cell::Boolean),
            ColumnKind::Date => parse_date(trimmed).map(Cell::Date),
            ColumnKind::Timestamp => DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    parse_date(trimmed)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|naive| naive.and_utc())
                })
                .map(Cell::Timestamp),
        }
    }

    /// Forma textual canônica, usada em comparações entre tipos diferentes
    pub fn as_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Decimal(d) => d.normalize().to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Boolean(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Timestamp(ts) => ts.to_rfc3339(),
        }
    }

    /// Forma exibida no CSV exportado (datas curtas, booleanos "Yes"/"No")
    pub fn render(&self) -> String {
        match self {
            Cell::Boolean(true) => "Yes".to_string(),
            Cell::Boolean(false) => "No".to_string(),
            Cell::Timestamp(ts) => ts.format("%Y-%m-%d").to_string(),
            other => other.as_text(),
        }
    }

    pub fn loosely_eq(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Null, _) | (_, Cell::Null) => false,
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Decimal(a), Cell::Decimal(b)) => a == b,
            (Cell::Integer(a), Cell::Integer(b)) => a == b,
            (Cell::Boolean(a), Cell::Boolean(b)) => a == b,
            (Cell::Date(a), Cell::Date(b)) => a == b,
            (Cell::Timestamp(a), Cell::Timestamp(b)) => a == b,
            (a, b) => a.as_text() == b.as_text(),
        }
    }

    /// Ordenação com nulos sempre por último (igual ao NULLS LAST do SQL)
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (Cell::Null, _) => Ordering::Greater,
            (_, Cell::Null) => Ordering::Less,
            (Cell::Decimal(a), Cell::Decimal(b)) => a.cmp(b),
            (Cell::Integer(a), Cell::Integer(b)) => a.cmp(b),
            (Cell::Boolean(a), Cell::Boolean(b)) => a.cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            (Cell::Timestamp(a), Cell::Timestamp(b)) => a.cmp(b),
            (a, b) => a.as_text().cmp(&b.as_text()),
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Null)
    }
}

pub(crate) fn text_cell(value: &Option<String>) -> Cell {
    value.clone().into()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// --- REGISTROS ---

/// Contrato comum de Account e Contact: o motor de filtro/CSV só conversa com isto.
pub trait CrmRecord:
    Clone + Serialize + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static
{
    type Draft: RecordDraft;

    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Valor de uma coluna do catálogo (`Cell::Null` para chaves desconhecidas)
    fn cell(&self, key: &str) -> Cell;

    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Substitui todas as colunas editáveis pelo rascunho
    fn apply_draft(&mut self, draft: Self::Draft, now: DateTime<Utc>);
}

/// Dados de criação/edição de um registro (corpo do POST/PUT ou linha de CSV).
pub trait RecordDraft: Clone + DeserializeOwned + Validate + Send + Sync + 'static {
    fn from_import_row(row: &ImportRow<'_>) -> Self;

    fn requested_id(&self) -> Option<&str>;
}

/// Linha de importação já mapeada: chave do campo -> valor (já com trim).
pub struct ImportRow<'a>(pub &'a HashMap<String, String>);

impl ImportRow<'_> {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn required_text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn decimal(&self, key: &str) -> Option<Decimal> {
        match self.get(key).and_then(|v| Cell::parse(ColumnKind::Decimal, v)) {
            Some(Cell::Decimal(d)) => Some(d),
            _ => None,
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(parse_integer)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.get(key).and_then(parse_date)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(parse_bool).unwrap_or(false)
    }
}

// ---
// Desserializadores tolerantes: o formulário manda "" para campo vazio
// ---

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(s)) if s.trim().is_empty() => None,
        Some(Loose::Text(s)) => Some(s),
        Some(Loose::Number(n)) => Some(n.to_string()),
        Some(Loose::Bool(b)) => Some(b.to_string()),
        None => None,
    })
}

pub fn loose_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(s)) => match Cell::parse(ColumnKind::Decimal, &s) {
            Some(Cell::Decimal(d)) => Some(d),
            _ => None,
        },
        Some(Loose::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    })
}

pub fn loose_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(s)) => parse_integer(s.trim()),
        Some(Loose::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        _ => None,
    })
}

pub fn loose_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(s)) => parse_date(s.trim()),
        _ => None,
    })
}

pub fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Bool(b)) => b,
        Some(Loose::Text(s)) => parse_bool(&s).unwrap_or(false),
        Some(Loose::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        None => false,
    })
}

// src/models/account.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::contact::ContactSummary;
use crate::models::entity::{
    blank_as_none, loose_date, loose_decimal, loose_integer, text_cell, Cell, Column, ColumnKind,
    CrmRecord, EntityKind, ImportRow, RecordDraft,
};

pub const ACCOUNT_COLUMNS: &[Column] = &[
    Column::text("id", "id", "ID"),
    Column::text("name", "name", "Name"),
    Column::text("type", "account_type", "Type"),
    Column::text("parentId", "parent_id", "Parent ID"),
    Column::text("phone", "phone", "Phone"),
    Column::text("website", "website", "Website"),
    Column::text("industry", "industry", "Industry"),
    Column::new("annualRevenue", "annual_revenue", "Annual Revenue", ColumnKind::Decimal),
    Column::new("numberOfEmployees", "number_of_employees", "Number of Employees", ColumnKind::Integer),
    Column::text("description", "description", "Description"),
    Column::text("rating", "rating", "Rating"),
    Column::text("accountSource", "account_source", "Account Source"),
    Column::text("accountStatus", "account_status", "Account Status"),
    Column::text("libPic", "lib_pic", "LiB PIC"),
    Column::text("national", "national", "National"),
    Column::text("target", "target", "Target"),
    Column::text("billingStreet", "billing_street", "Billing Street"),
    Column::text("billingCity", "billing_city", "Billing City"),
    Column::text("billingState", "billing_state", "Billing State"),
    Column::text("billingPostalCode", "billing_postal_code", "Billing Postal Code"),
    Column::text("billingCountry", "billing_country", "Billing Country"),
    Column::new("lastContactDate", "last_contact_date", "Last Contact Date", ColumnKind::Date),
    Column::text("note", "note", "Note"),
    Column::system("createdDate", "created_date", "Created Date"),
    Column::system("lastModifiedDate", "last_modified_date", "Last Modified Date"),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[schema(example = "ACC1718900000000x7k2p")]
    pub id: String,
    #[schema(example = "Acme Corp")]
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub parent_id: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[schema(example = "Technology")]
    pub industry: Option<String>,
    pub annual_revenue: Option<Decimal>,
    pub number_of_employees: Option<i64>,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub account_source: Option<String>,
    #[schema(example = "Active")]
    pub account_status: Option<String>,
    pub lib_pic: Option<String>,
    pub national: Option<String>,
    pub target: Option<String>,
    pub billing_street: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_country: Option<String>,
    pub last_contact_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

// Corpo do POST/PUT. Campos vazios ("") viram null, números aceitam string.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Acme Corp")]
    pub name: String,

    #[serde(default, rename = "type", deserialize_with = "blank_as_none")]
    pub account_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "loose_decimal")]
    #[schema(value_type = Option<f64>)]
    pub annual_revenue: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_integer")]
    pub number_of_employees: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub account_source: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub account_status: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub lib_pic: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub national: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_street: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_state: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_postal_code: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_country: Option<String>,
    #[serde(default, deserialize_with = "loose_date")]
    #[schema(value_type = Option<String>, format = Date, example = "2024-05-20")]
    pub last_contact_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub note: Option<String>,
}

impl RecordDraft for AccountDraft {
    fn from_import_row(row: &ImportRow<'_>) -> Self {
        Self {
            id: row.text("id"),
            name: row.required_text("name"),
            account_type: row.text("type"),
            parent_id: row.text("parentId"),
            phone: row.text("phone"),
            website: row.text("website"),
            industry: row.text("industry"),
            annual_revenue: row.decimal("annualRevenue"),
            number_of_employees: row.integer("numberOfEmployees"),
            description: row.text("description"),
            rating: row.text("rating"),
            account_source: row.text("accountSource"),
            account_status: row.text("accountStatus"),
            lib_pic: row.text("libPic"),
            national: row.text("national"),
            target: row.text("target"),
            billing_street: row.text("billingStreet"),
            billing_city: row.text("billingCity"),
            billing_state: row.text("billingState"),
            billing_postal_code: row.text("billingPostalCode"),
            billing_country: row.text("billingCountry"),
            last_contact_date: row.date("lastContactDate"),
            note: row.text("note"),
        }
    }

    fn requested_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl CrmRecord for Account {
    type Draft = AccountDraft;

    const KIND: EntityKind = EntityKind::Account;

    fn id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "id" => Cell::Text(self.id.clone()),
            "name" => Cell::Text(self.name.clone()),
            "type" => text_cell(&self.account_type),
            "parentId" => text_cell(&self.parent_id),
            "phone" => text_cell(&self.phone),
            "website" => text_cell(&self.website),
            "industry" => text_cell(&self.industry),
            "annualRevenue" => self.annual_revenue.map(Cell::Decimal).unwrap_or(Cell::Null),
            "numberOfEmployees" => self.number_of_employees.map(Cell::Integer).unwrap_or(Cell::Null),
            "description" => text_cell(&self.description),
            "rating" => text_cell(&self.rating),
            "accountSource" => text_cell(&self.account_source),
            "accountStatus" => text_cell(&self.account_status),
            "libPic" => text_cell(&self.lib_pic),
            "national" => text_cell(&self.national),
            "target" => text_cell(&self.target),
            "billingStreet" => text_cell(&self.billing_street),
            "billingCity" => text_cell(&self.billing_city),
            "billingState" => text_cell(&self.billing_state),
            "billingPostalCode" => text_cell(&self.billing_postal_code),
            "billingCountry" => text_cell(&self.billing_country),
            "lastContactDate" => self.last_contact_date.map(Cell::Date).unwrap_or(Cell::Null),
            "note" => text_cell(&self.note),
            "createdDate" => Cell::Timestamp(self.created_date),
            "lastModifiedDate" => Cell::Timestamp(self.last_modified_date),
            _ => Cell::Null,
        }
    }

    fn from_draft(id: String, draft: AccountDraft, now: DateTime<Utc>) -> Self {
        let mut account = Account {
            id,
            name: String::new(),
            account_type: None,
            parent_id: None,
            phone: None,
            website: None,
            industry: None,
            annual_revenue: None,
            number_of_employees: None,
            description: None,
            rating: None,
            account_source: None,
            account_status: None,
            lib_pic: None,
            national: None,
            target: None,
            billing_street: None,
            billing_city: None,
            billing_state: None,
            billing_postal_code: None,
            billing_country: None,
            last_contact_date: None,
            note: None,
            created_date: now,
            last_modified_date: now,
        };
        account.apply_draft(draft, now);
        account
    }

    fn apply_draft(&mut self, draft: AccountDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.account_type = draft.account_type;
        self.parent_id = draft.parent_id;
        self.phone = draft.phone;
        self.website = draft.website;
        self.industry = draft.industry;
        self.annual_revenue = draft.annual_revenue;
        self.number_of_employees = draft.number_of_employees;
        self.description = draft.description;
        self.rating = draft.rating;
        self.account_source = draft.account_source;
        self.account_status = draft.account_status;
        self.lib_pic = draft.lib_pic;
        self.national = draft.national;
        self.target = draft.target;
        self.billing_street = draft.billing_street;
        self.billing_city = draft.billing_city;
        self.billing_state = draft.billing_state;
        self.billing_postal_code = draft.billing_postal_code;
        self.billing_country = draft.billing_country;
        self.last_contact_date = draft.last_contact_date;
        self.note = draft.note;
        self.last_modified_date = now;
    }
}

/// Referência curta a uma conta (conta-mãe, conta de um contato)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountRef {
    pub id: String,
    pub name: String,
}

impl From<Account> for AccountRef {
    fn from(a: Account) -> Self {
        Self { id: a.id, name: a.name }
    }
}

/// O que o detalhe da conta traz além das colunas base
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountRelations {
    pub parent: Option<AccountRef>,
    pub contacts: Vec<ContactSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn draft_accepts_blank_strings_and_numeric_text() {
        let draft: AccountDraft = serde_json::from_value(serde_json::json!({
            "name": "Acme Corp",
            "industry": "",
            "annualRevenue": "1500.50",
            "numberOfEmployees": 42,
            "type": "Customer"
        }))
        .unwrap();

        assert_eq!(draft.industry, None);
        assert_eq!(draft.annual_revenue, Some(Decimal::new(150050, 2)));
        assert_eq!(draft.number_of_employees, Some(42));
        assert_eq!(draft.account_type.as_deref(), Some("Customer"));
    }

    #[test]
    fn every_catalog_column_is_readable() {
        let account = Account::from_draft(
            "ACC1".into(),
            AccountDraft { name: "Acme".into(), ..Default::default() },
            Utc::now(),
        );
        for column in ACCOUNT_COLUMNS {
            // "name", "id" e datas sempre preenchidos; o resto é nulo aqui
            let cell = account.cell(column.key);
            let expected_filled = matches!(column.key, "id" | "name" | "createdDate" | "lastModifiedDate");
            assert_eq!(!cell.is_null(), expected_filled, "coluna {}", column.key);
        }
    }

    #[test]
    fn import_row_builds_typed_draft() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Globex".to_string());
        values.insert("numberOfEmployees".to_string(), "120".to_string());
        values.insert("annualRevenue".to_string(), "not a number".to_string());

        let draft = AccountDraft::from_import_row(&ImportRow(&values));
        assert_eq!(draft.name, "Globex");
        assert_eq!(draft.number_of_employees, Some(120));
        assert_eq!(draft.annual_revenue, None);
    }
}

// src/models/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::account::AccountRef;
use crate::models::entity::{
    blank_as_none, loose_bool, text_cell, Cell, Column, ColumnKind, CrmRecord, EntityKind,
    ImportRow, RecordDraft,
};

pub const CONTACT_COLUMNS: &[Column] = &[
    Column::text("id", "id", "ID"),
    Column::text("accountId", "account_id", "Account ID"),
    Column::text("salutation", "salutation", "Salutation"),
    Column::text("firstName", "first_name", "First Name"),
    Column::text("lastName", "last_name", "Last Name"),
    Column::text("middleName", "middle_name", "Middle Name"),
    Column::text("email", "email", "Email"),
    Column::text("phone", "phone", "Phone"),
    Column::text("mobilePhone", "mobile_phone", "Mobile Phone"),
    Column::text("title", "title", "Title"),
    Column::text("department", "department", "Department"),
    Column::text("mailingStreet", "mailing_street", "Mailing Street"),
    Column::text("mailingCity", "mailing_city", "Mailing City"),
    Column::text("mailingState", "mailing_state", "Mailing State"),
    Column::text("mailingPostalCode", "mailing_postal_code", "Mailing Postal Code"),
    Column::text("mailingCountry", "mailing_country", "Mailing Country"),
    Column::text("leadSource", "lead_source", "Lead Source"),
    Column::text("description", "description", "Description"),
    Column::new("hasOptedOutOfEmail", "has_opted_out_of_email", "Email Opt Out", ColumnKind::Boolean),
    Column::new("doNotCall", "do_not_call", "Do Not Call", ColumnKind::Boolean),
    Column::text("contactStatus", "contact_status", "Contact Status"),
    Column::new("executiveOrNot", "executive_or_not", "Executive", ColumnKind::Boolean),
    Column::text("rating", "rating", "Rating"),
    Column::new("worthFollowing", "worth_following", "Worth Following", ColumnKind::Boolean),
    Column::text("personCountry", "person_country", "Person Country"),
    Column::new(
        "doNotSendWhitepaper",
        "do_not_send_whitepaper",
        "Do Not Send Whitepaper",
        ColumnKind::Boolean,
    ),
    Column::text("reportsToId", "reports_to_id", "Reports To ID"),
    Column::system("createdDate", "created_date", "Created Date"),
    Column::system("lastModifiedDate", "last_modified_date", "Last Modified Date"),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[schema(example = "CON1718900000000ab12c")]
    pub id: String,
    pub account_id: Option<String>,
    pub salutation: Option<String>,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Silva")]
    pub last_name: String,
    pub middle_name: Option<String>,
    #[schema(example = "maria@email.com")]
    pub email: String,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub mailing_street: Option<String>,
    pub mailing_city: Option<String>,
    pub mailing_state: Option<String>,
    pub mailing_postal_code: Option<String>,
    pub mailing_country: Option<String>,
    pub lead_source: Option<String>,
    pub description: Option<String>,
    pub has_opted_out_of_email: bool,
    pub do_not_call: bool,
    pub contact_status: Option<String>,
    pub executive_or_not: bool,
    pub rating: Option<String>,
    pub worth_following: bool,
    pub person_country: Option<String>,
    pub do_not_send_whitepaper: bool,
    pub reports_to_id: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

/// Resumo exibido no detalhe da conta
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: Option<String>,
    pub contact_status: Option<String>,
}

impl From<Contact> for ContactSummary {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            title: c.title,
            contact_status: c.contact_status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub salutation: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    #[schema(example = "Maria")]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    #[schema(example = "Silva")]
    pub last_name: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub middle_name: Option<String>,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "O email é obrigatório."),
        email(message = "O email é inválido.")
    )]
    #[schema(example = "maria@email.com")]
    pub email: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mobile_phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mailing_street: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mailing_city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mailing_state: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mailing_postal_code: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mailing_country: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub lead_source: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub has_opted_out_of_email: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub do_not_call: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub contact_status: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub executive_or_not: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub worth_following: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub person_country: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub do_not_send_whitepaper: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub reports_to_id: Option<String>,
}

impl RecordDraft for ContactDraft {
    fn from_import_row(row: &ImportRow<'_>) -> Self {
        Self {
            id: row.text("id"),
            account_id: row.text("accountId"),
            salutation: row.text("salutation"),
            first_name: row.required_text("firstName"),
            last_name: row.required_text("lastName"),
            middle_name: row.text("middleName"),
            email: row.required_text("email"),
            phone: row.text("phone"),
            mobile_phone: row.text("mobilePhone"),
            title: row.text("title"),
            department: row.text("department"),
            mailing_street: row.text("mailingStreet"),
            mailing_city: row.text("mailingCity"),
            mailing_state: row.text("mailingState"),
            mailing_postal_code: row.text("mailingPostalCode"),
            mailing_country: row.text("mailingCountry"),
            lead_source: row.text("leadSource"),
            description: row.text("description"),
            has_opted_out_of_email: row.flag("hasOptedOutOfEmail"),
            do_not_call: row.flag("doNotCall"),
            contact_status: row.text("contactStatus"),
            executive_or_not: row.flag("executiveOrNot"),
            rating: row.text("rating"),
            worth_following: row.flag("worthFollowing"),
            person_country: row.text("personCountry"),
            do_not_send_whitepaper: row.flag("doNotSendWhitepaper"),
            reports_to_id: row.text("reportsToId"),
        }
    }

    fn requested_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl CrmRecord for Contact {
    type Draft = ContactDraft;

    const KIND: EntityKind = EntityKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "id" => Cell::Text(self.id.clone()),
            "accountId" => text_cell(&self.account_id),
            "salutation" => text_cell(&self.salutation),
            "firstName" => Cell::Text(self.first_name.clone()),
            "lastName" => Cell::Text(self.last_name.clone()),
            "middleName" => text_cell(&self.middle_name),
            "email" => Cell::Text(self.email.clone()),
            "phone" => text_cell(&self.phone),
            "mobilePhone" => text_cell(&self.mobile_phone),
            "title" => text_cell(&self.title),
            "department" => text_cell(&self.department),
            "mailingStreet" => text_cell(&self.mailing_street),
            "mailingCity" => text_cell(&self.mailing_city),
            "mailingState" => text_cell(&self.mailing_state),
            "mailingPostalCode" => text_cell(&self.mailing_postal_code),
            "mailingCountry" => text_cell(&self.mailing_country),
            "leadSource" => text_cell(&self.lead_source),
            "description" => text_cell(&self.description),
            "hasOptedOutOfEmail" => Cell::Boolean(self.has_opted_out_of_email),
            "doNotCall" => Cell::Boolean(self.do_not_call),
            "contactStatus" => text_cell(&self.contact_status),
            "executiveOrNot" => Cell::Boolean(self.executive_or_not),
            "rating" => text_cell(&self.rating),
            "worthFollowing" => Cell::Boolean(self.worth_following),
            "personCountry" => text_cell(&self.person_country),
            "doNotSendWhitepaper" => Cell::Boolean(self.do_not_send_whitepaper),
            "reportsToId" => text_cell(&self.reports_to_id),
            "createdDate" => Cell::Timestamp(self.created_date),
            "lastModifiedDate" => Cell::Timestamp(self.last_modified_date),
            _ => Cell::Null,
        }
    }

    fn from_draft(id: String, draft: ContactDraft, now: DateTime<Utc>) -> Self {
        let mut contact = Contact {
            id,
            account_id: None,
            salutation: None,
            first_name: String::new(),
            last_name: String::new(),
            middle_name: None,
            email: String::new(),
            phone: None,
            mobile_phone: None,
            title: None,
            department: None,
            mailing_street: None,
            mailing_city: None,
            mailing_state: None,
            mailing_postal_code: None,
            mailing_country: None,
            lead_source: None,
            description: None,
            has_opted_out_of_email: false,
            do_not_call: false,
            contact_status: None,
            executive_or_not: false,
            rating: None,
            worth_following: false,
            person_country: None,
            do_not_send_whitepaper: false,
            reports_to_id: None,
            created_date: now,
            last_modified_date: now,
        };
        contact.apply_draft(draft, now);
        contact
    }

    fn apply_draft(&mut self, draft: ContactDraft, now: DateTime<Utc>) {
        self.account_id = draft.account_id;
        self.salutation = draft.salutation;
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.middle_name = draft.middle_name;
        self.email = draft.email;
        self.phone = draft.phone;
        self.mobile_phone = draft.mobile_phone;
        self.title = draft.title;
        self.department = draft.department;
        self.mailing_street = draft.mailing_street;
        self.mailing_city = draft.mailing_city;
        self.mailing_state = draft.mailing_state;
        self.mailing_postal_code = draft.mailing_postal_code;
        self.mailing_country = draft.mailing_country;
        self.lead_source = draft.lead_source;
        self.description = draft.description;
        self.has_opted_out_of_email = draft.has_opted_out_of_email;
        self.do_not_call = draft.do_not_call;
        self.contact_status = draft.contact_status;
        self.executive_or_not = draft.executive_or_not;
        self.rating = draft.rating;
        self.worth_following = draft.worth_following;
        self.person_country = draft.person_country;
        self.do_not_send_whitepaper = draft.do_not_send_whitepaper;
        self.reports_to_id = draft.reports_to_id;
        self.last_modified_date = now;
    }
}

/// O que o detalhe do contato traz além das colunas base
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRelations {
    pub account: Option<AccountRef>,
    pub reports_to: Option<ContactSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn draft_requires_names_and_valid_email() {
        let draft: ContactDraft = serde_json::from_value(serde_json::json!({
            "firstName": "Maria",
            "lastName": "",
            "email": "not-an-email",
            "doNotCall": "true"
        }))
        .unwrap();

        assert!(draft.do_not_call);
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("last_name"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn boolean_columns_expose_boolean_cells() {
        let contact = Contact::from_draft(
            "CON1".into(),
            ContactDraft {
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                email: "ana@lima.com".into(),
                worth_following: true,
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(contact.cell("worthFollowing"), Cell::Boolean(true));
        assert_eq!(contact.cell("doNotCall"), Cell::Boolean(false));
        assert_eq!(contact.cell("accountId"), Cell::Null);
    }
}

// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Custom Fields ---
        handlers::fields::list_fields,
        handlers::fields::list_field_types,
        handlers::fields::create_field,
        handlers::fields::update_field,
        handlers::fields::delete_field,
        handlers::field_values::get_field_values,
        handlers::field_values::set_field_values,

        // --- Accounts ---
        handlers::accounts::list_accounts,
        handlers::accounts::create_account,
        handlers::accounts::get_account,
        handlers::accounts::update_account,
        handlers::accounts::delete_account,
        handlers::accounts::export_accounts,
        handlers::accounts::account_import_targets,
        handlers::accounts::preview_account_import,
        handlers::accounts::import_accounts,

        // --- Contacts ---
        handlers::contacts::list_contacts,
        handlers::contacts::create_contact,
        handlers::contacts::get_contact,
        handlers::contacts::update_contact,
        handlers::contacts::delete_contact,
        handlers::contacts::export_contacts,
        handlers::contacts::contact_import_targets,
        handlers::contacts::preview_contact_import,
        handlers::contacts::import_contacts,

        // --- Email Campaigns ---
        handlers::campaigns::list_templates,
        handlers::campaigns::create_template,
        handlers::campaigns::get_template,
        handlers::campaigns::update_template,
        handlers::campaigns::delete_template,
        handlers::campaigns::list_campaigns,
        handlers::campaigns::create_campaign,
        handlers::campaigns::get_campaign,
    ),
    components(
        schemas(
            // --- Custom Fields ---
            models::entity::EntityKind,
            models::fields::FieldType,
            models::fields::FieldTypeOption,
            models::fields::FieldDefinition,
            models::fields::FieldValue,
            models::fields::CustomFieldEntry,
            models::fields::CreateFieldPayload,
            models::fields::UpdateFieldPayload,
            models::fields::SetFieldValuesPayload,

            // --- Accounts ---
            models::account::Account,
            models::account::AccountDraft,
            models::account::AccountRef,
            models::account::AccountRelations,

            // --- Contacts ---
            models::contact::Contact,
            models::contact::ContactDraft,
            models::contact::ContactSummary,
            models::contact::ContactRelations,

            // --- Import / Export ---
            models::listing::MappingTarget,
            models::listing::ImportPreviewRequest,
            models::listing::ImportPreview,
            models::listing::ImportRequest,
            models::listing::ImportSummary,
            handlers::records::DeleteResponse,

            // --- Email Campaigns ---
            models::campaign::EmailTemplate,
            models::campaign::TemplatePayload,
            models::campaign::CampaignStatus,
            models::campaign::EmailCampaign,
            models::campaign::CampaignPayload,
            models::campaign::CampaignDetail,
        )
    ),
    tags(
        (name = "Custom Fields", description = "Campos customizados e seus valores"),
        (name = "Accounts", description = "Contas (empresas)"),
        (name = "Contacts", description = "Contatos (pessoas)"),
        (name = "Email Campaigns", description = "Templates de email e rascunhos de campanha")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_crm_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/accounts/{id}"));
        assert!(doc.paths.paths.contains_key("/api/contacts/import/preview"));
        assert!(doc.paths.paths.contains_key("/api/field-values"));
        assert!(doc.paths.paths.contains_key("/api/campaigns/{id}"));
        assert!(doc.paths.paths.contains_key("/api/templates"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}

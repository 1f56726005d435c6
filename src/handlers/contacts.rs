// src/handlers/contacts.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::records::{csv_attachment, deleted, DeleteResponse},
    models::{
        account::AccountRef,
        contact::{Contact, ContactDraft, ContactRelations, ContactSummary},
        entity::EntityKind,
        listing::{
            ImportPreview, ImportPreviewRequest, ImportRequest, ImportSummary, ListParams,
            MappingTarget, Paginated, RecordDetail, RecordUpdate,
        },
    },
};

// GET /api/contacts
#[utoipa::path(
    get,
    path = "/api/contacts",
    tag = "Contacts",
    params(
        ("page" = Option<i64>, Query, description = "Página (começa em 1)"),
        ("search" = Option<String>, Query, description = "Busca em nome, sobrenome, email e cargo"),
        ("sortBy" = Option<String>, Query, description = "Chave de coluna (padrão: lastName)"),
        ("sortDir" = Option<String>, Query, description = "asc | desc"),
        ("all" = Option<bool>, Query, description = "true desliga a paginação"),
        ("filters" = Option<String>, Query, description = "JSON: [{field, operator, value}]"),
        ("contactStatus" = Option<String>, Query, description = "Filtro exato"),
        ("personCountry" = Option<String>, Query, description = "Filtro exato"),
        ("executiveOrNot" = Option<String>, Query, description = "Filtro exato (true/false)"),
        ("worthFollowing" = Option<String>, Query, description = "Filtro exato (true/false)")
    ),
    responses(
        (status = 200, description = "Página de contatos", body = Paginated<Contact>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contacts(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = ListParams::from_query(EntityKind::Contact, &query);
    let page = app_state.contact_service.list(&params).await?;
    Ok((StatusCode::OK, Json(page)))
}

// POST /api/contacts
#[utoipa::path(
    post,
    path = "/api/contacts",
    tag = "Contacts",
    request_body = ContactDraft,
    responses(
        (status = 201, description = "Contato criado", body = Contact),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "ID já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contact(
    State(app_state): State<AppState>,
    Json(payload): Json<ContactDraft>,
) -> Result<impl IntoResponse, AppError> {
    let contact = app_state.contact_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

// GET /api/contacts/{id}
#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "ID do contato")),
    responses(
        (status = 200, description = "Contato com campos customizados, conta e superior", body = Contact),
        (status = 404, description = "Contato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_contact(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (contact, custom_fields) = app_state.contact_service.detail(&id).await?;

    let account = match contact.account_id.as_deref() {
        Some(account_id) => app_state
            .account_service
            .find_optional(account_id)
            .await?
            .map(AccountRef::from),
        None => None,
    };

    let reports_to = match contact.reports_to_id.as_deref() {
        Some(manager_id) => app_state
            .contact_service
            .find_optional(manager_id)
            .await?
            .map(ContactSummary::from),
        None => None,
    };

    Ok(Json(RecordDetail {
        record: contact,
        custom_fields,
        extra: ContactRelations { account, reports_to },
    }))
}

// PUT /api/contacts/{id}
#[utoipa::path(
    put,
    path = "/api/contacts/{id}",
    tag = "Contacts",
    request_body = ContactDraft,
    params(("id" = String, Path, description = "ID do contato")),
    responses(
        (status = 200, description = "Contato atualizado", body = Contact),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Contato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_contact(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecordUpdate<ContactDraft>>,
) -> Result<impl IntoResponse, AppError> {
    let custom_values = payload.values_by_field_id();
    let contact = app_state
        .contact_service
        .update(&id, payload.draft, &custom_values)
        .await?;
    Ok(Json(contact))
}

// DELETE /api/contacts/{id}
#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "ID do contato")),
    responses(
        (status = 200, description = "Contato removido", body = DeleteResponse),
        (status = 404, description = "Contato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_contact(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.contact_service.delete(&id).await?;
    Ok(deleted())
}

// --- Import / Export ---

// GET /api/contacts/export
#[utoipa::path(
    get,
    path = "/api/contacts/export",
    tag = "Contacts",
    params(
        ("columns" = Option<String>, Query, description = "Chaves das colunas, separadas por vírgula"),
        ("all" = Option<bool>, Query, description = "true exporta todas as linhas filtradas")
    ),
    responses(
        (status = 200, description = "Arquivo CSV", content_type = "text/csv", body = String)
    ),
    security(("api_jwt" = []))
)]
pub async fn export_contacts(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = ListParams::from_query(EntityKind::Contact, &query);
    let file = app_state.contact_transfer.export(&params).await?;
    Ok(csv_attachment(file))
}

// GET /api/contacts/import/targets
#[utoipa::path(
    get,
    path = "/api/contacts/import/targets",
    tag = "Contacts",
    responses(
        (status = 200, description = "Campos que aceitam dados do CSV", body = Vec<MappingTarget>)
    ),
    security(("api_jwt" = []))
)]
pub async fn contact_import_targets(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.contact_transfer.targets())
}

// POST /api/contacts/import/preview
#[utoipa::path(
    post,
    path = "/api/contacts/import/preview",
    tag = "Contacts",
    request_body = ImportPreviewRequest,
    responses(
        (status = 200, description = "Cabeçalhos, amostra e mapeamento sugerido", body = ImportPreview),
        (status = 400, description = "CSV vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_contact_import(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportPreviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let preview = app_state.contact_transfer.preview(&payload.csv)?;
    Ok(Json(preview))
}

// POST /api/contacts/import
#[utoipa::path(
    post,
    path = "/api/contacts/import",
    tag = "Contacts",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "CSV vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_contacts(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.contact_transfer.import(payload).await?;
    Ok(Json(ImportSummary::new(EntityKind::Contact, outcome)))
}

// src/handlers/accounts.rs

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
        account::{Account, AccountDraft, AccountRef, AccountRelations},
        contact::ContactSummary,
        entity::EntityKind,
        listing::{
            ImportPreview, ImportPreviewRequest, ImportRequest, ImportSummary, ListParams,
            MappingTarget, Paginated, RecordDetail, RecordUpdate,
        },
    },
};

// =============================================================================
//  CRUD
// =============================================================================

// GET /api/accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "Accounts",
    params(
        ("page" = Option<i64>, Query, description = "Página (começa em 1)"),
        ("search" = Option<String>, Query, description = "Busca em nome, indústria e telefone"),
        ("sortBy" = Option<String>, Query, description = "Chave de coluna (padrão: name)"),
        ("sortDir" = Option<String>, Query, description = "asc | desc"),
        ("all" = Option<bool>, Query, description = "true desliga a paginação"),
        ("filters" = Option<String>, Query, description = "JSON: [{field, operator, value}]"),
        ("accountStatus" = Option<String>, Query, description = "Filtro exato"),
        ("industry" = Option<String>, Query, description = "Filtro exato"),
        ("national" = Option<String>, Query, description = "Filtro exato"),
        ("target" = Option<String>, Query, description = "Filtro exato"),
        ("libPic" = Option<String>, Query, description = "Filtro exato")
    ),
    responses(
        (status = 200, description = "Página de contas", body = Paginated<Account>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_accounts(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = ListParams::from_query(EntityKind::Account, &query);
    let page = app_state.account_service.list(&params).await?;
    Ok((StatusCode::OK, Json(page)))
}

// POST /api/accounts
#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "Accounts",
    request_body = AccountDraft,
    responses(
        (status = 201, description = "Conta criada", body = Account),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "ID já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_account(
    State(app_state): State<AppState>,
    Json(payload): Json<AccountDraft>,
) -> Result<impl IntoResponse, AppError> {
    let account = app_state.account_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

// GET /api/accounts/{id}
#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "ID da conta")),
    responses(
        (status = 200, description = "Conta com campos customizados, conta-mãe e contatos", body = Account),
        (status = 404, description = "Conta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_account(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (account, custom_fields) = app_state.account_service.detail(&id).await?;

    let parent = match account.parent_id.as_deref() {
        Some(parent_id) => app_state
            .account_service
            .find_optional(parent_id)
            .await?
            .map(AccountRef::from),
        None => None,
    };

    let contacts = app_state
        .contact_service
        .find_by("accountId", &account.id)
        .await?
        .into_iter()
        .map(ContactSummary::from)
        .collect();

    Ok(Json(RecordDetail {
        record: account,
        custom_fields,
        extra: AccountRelations { parent, contacts },
    }))
}

// PUT /api/accounts/{id}
#[utoipa::path(
    put,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    request_body = AccountDraft,
    params(("id" = String, Path, description = "ID da conta")),
    responses(
        (status = 200, description = "Conta atualizada", body = Account),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Conta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_account(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecordUpdate<AccountDraft>>,
) -> Result<impl IntoResponse, AppError> {
    let custom_values = payload.values_by_field_id();
    let account = app_state
        .account_service
        .update(&id, payload.draft, &custom_values)
        .await?;
    Ok(Json(account))
}

// DELETE /api/accounts/{id}
#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "ID da conta")),
    responses(
        (status = 200, description = "Conta removida", body = DeleteResponse),
        (status = 404, description = "Conta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_account(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.account_service.delete(&id).await?;
    Ok(deleted())
}

// =============================================================================
//  IMPORT / EXPORT
// =============================================================================

// GET /api/accounts/export
#[utoipa::path(
    get,
    path = "/api/accounts/export",
    tag = "Accounts",
    params(
        ("columns" = Option<String>, Query, description = "Chaves das colunas, separadas por vírgula (aceita fieldKey de campo customizado)"),
        ("all" = Option<bool>, Query, description = "true exporta todas as linhas filtradas")
    ),
    responses(
        (status = 200, description = "Arquivo CSV", content_type = "text/csv", body = String)
    ),
    security(("api_jwt" = []))
)]
pub async fn export_accounts(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = ListParams::from_query(EntityKind::Account, &query);
    let file = app_state.account_transfer.export(&params).await?;
    Ok(csv_attachment(file))
}

// GET /api/accounts/import/targets
#[utoipa::path(
    get,
    path = "/api/accounts/import/targets",
    tag = "Accounts",
    responses(
        (status = 200, description = "Campos que aceitam dados do CSV", body = Vec<MappingTarget>)
    ),
    security(("api_jwt" = []))
)]
pub async fn account_import_targets(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.account_transfer.targets())
}

// POST /api/accounts/import/preview
#[utoipa::path(
    post,
    path = "/api/accounts/import/preview",
    tag = "Accounts",
    request_body = ImportPreviewRequest,
    responses(
        (status = 200, description = "Cabeçalhos, amostra e mapeamento sugerido", body = ImportPreview),
        (status = 400, description = "CSV vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_account_import(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportPreviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let preview = app_state.account_transfer.preview(&payload.csv)?;
    Ok(Json(preview))
}

// POST /api/accounts/import
#[utoipa::path(
    post,
    path = "/api/accounts/import",
    tag = "Accounts",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "CSV vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_accounts(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.account_transfer.import(payload).await?;
    Ok(Json(ImportSummary::new(EntityKind::Account, outcome)))
}

// src/handlers/fields.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::records::removed_values,
    middleware::auth::AuthenticatedUser,
    models::{
        entity::EntityKind,
        fields::{CreateFieldPayload, FieldDefinition, FieldTypeOption, UpdateFieldPayload},
    },
};

#[derive(Debug, Deserialize)]
pub struct EntityQuery {
    pub entity: Option<String>,
}

/// Sem `entity` na query a tela de configuração abre em contas
fn entity_or_default(raw: Option<&str>) -> Result<EntityKind, AppError> {
    match raw.map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => EntityKind::parse(raw)
            .ok_or_else(|| AppError::InvalidInput(format!("Entidade desconhecida: '{}'", raw))),
        None => Ok(EntityKind::Account),
    }
}

// =============================================================================
//  DEFINIÇÕES DE CAMPO
// =============================================================================

// GET /api/fields
#[utoipa::path(
    get,
    path = "/api/fields",
    tag = "Custom Fields",
    params(
        ("entity" = Option<String>, Query, description = "account | contact (padrão: account)")
    ),
    responses(
        (status = 200, description = "Campos ordenados por sortOrder", body = Vec<FieldDefinition>),
        (status = 400, description = "Entidade desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_fields(
    State(app_state): State<AppState>,
    Query(query): Query<EntityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_or_default(query.entity.as_deref())?;
    let fields = app_state.field_service.list_fields(entity).await?;
    Ok((StatusCode::OK, Json(fields)))
}

// GET /api/fields/types
#[utoipa::path(
    get,
    path = "/api/fields/types",
    tag = "Custom Fields",
    responses(
        (status = 200, description = "Catálogo de tipos de campo", body = Vec<FieldTypeOption>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_field_types(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.field_service.field_types())
}

// POST /api/fields
#[utoipa::path(
    post,
    path = "/api/fields",
    tag = "Custom Fields",
    request_body = CreateFieldPayload,
    responses(
        (status = 201, description = "Campo customizado criado", body = FieldDefinition),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Já existe um campo com essa chave")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_field(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateFieldPayload>,
) -> Result<impl IntoResponse, AppError> {
    let field = app_state.field_service.create_field(payload).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

// PATCH /api/fields/{id}
#[utoipa::path(
    patch,
    path = "/api/fields/{id}",
    tag = "Custom Fields",
    request_body = UpdateFieldPayload,
    params(
        ("id" = i64, Path, description = "ID da definição")
    ),
    responses(
        (status = 200, description = "Campo atualizado", body = FieldDefinition),
        (status = 404, description = "Campo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_field(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFieldPayload>,
) -> Result<impl IntoResponse, AppError> {
    let field = app_state.field_service.update_field(id, payload).await?;
    Ok((StatusCode::OK, Json(field)))
}

// DELETE /api/fields/{id}
#[utoipa::path(
    delete,
    path = "/api/fields/{id}",
    tag = "Custom Fields",
    params(
        ("id" = i64, Path, description = "ID da definição")
    ),
    responses(
        (status = 200, description = "Campo e todos os seus valores removidos"),
        (status = 404, description = "Campo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_field(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let removed = app_state.field_service.delete_field(id).await?;
    tracing::info!("Campo {} removido por {}", id, claims.sub);
    Ok(removed_values(removed))
}

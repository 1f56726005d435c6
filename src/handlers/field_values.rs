// src/handlers/field_values.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        entity::EntityKind,
        fields::{CustomFieldEntry, SetFieldValuesPayload},
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValuesQuery {
    pub entity: Option<String>,
    pub record_id: Option<String>,
}

fn parse_entity(raw: &str) -> Result<EntityKind, AppError> {
    EntityKind::parse(raw).ok_or_else(|| AppError::InvalidInput(format!("Entidade desconhecida: '{}'", raw)))
}

// GET /api/field-values
#[utoipa::path(
    get,
    path = "/api/field-values",
    tag = "Custom Fields",
    params(
        ("entity" = String, Query, description = "account | contact"),
        ("recordId" = String, Query, description = "ID do registro")
    ),
    responses(
        (status = 200, description = "Valores gravados, cada um com sua definição", body = Vec<CustomFieldEntry>),
        (status = 400, description = "entity ou recordId ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_field_values(
    State(app_state): State<AppState>,
    Query(query): Query<FieldValuesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entity = query.entity.as_deref().map(str::trim).unwrap_or_default();
    let record_id = query.record_id.as_deref().map(str::trim).unwrap_or_default();
    if entity.is_empty() || record_id.is_empty() {
        return Err(AppError::InvalidInput("Os parâmetros entity e recordId são obrigatórios.".to_string()));
    }

    let values = app_state
        .field_service
        .get_values(parse_entity(entity)?, record_id)
        .await?;
    Ok((StatusCode::OK, Json(values)))
}

// PUT /api/field-values
#[utoipa::path(
    put,
    path = "/api/field-values",
    tag = "Custom Fields",
    request_body = SetFieldValuesPayload,
    responses(
        (status = 200, description = "Valores gravados (upsert); devolve o estado atual do registro", body = Vec<CustomFieldEntry>),
        (status = 400, description = "Entidade desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_field_values(
    State(app_state): State<AppState>,
    Json(payload): Json<SetFieldValuesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let entity = parse_entity(&payload.entity)?;
    let record_id = payload.record_id.trim();
    if record_id.is_empty() {
        return Err(AppError::InvalidInput("O parâmetro recordId é obrigatório.".to_string()));
    }

    app_state
        .field_service
        .set_values(entity, record_id, &payload.values)
        .await?;

    let values = app_state.field_service.get_values(entity, record_id).await?;
    Ok((StatusCode::OK, Json(values)))
}

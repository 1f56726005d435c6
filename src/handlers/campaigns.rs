// src/handlers/campaigns.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::records::{deleted, DeleteResponse},
    middleware::auth::AuthenticatedUser,
    models::campaign::{CampaignDetail, CampaignPayload, EmailCampaign, EmailTemplate, TemplatePayload},
};

// =============================================================================
//  TEMPLATES
// =============================================================================

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Email Campaigns",
    responses(
        (status = 200, description = "Templates, mais recentes primeiro", body = Vec<EmailTemplate>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_templates(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let templates = app_state.campaign_service.list_templates().await?;
    Ok(Json(templates))
}

// POST /api/templates
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Email Campaigns",
    request_body = TemplatePayload,
    responses(
        (status = 201, description = "Template criado", body = EmailTemplate),
        (status = 400, description = "Nome ou assunto ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let template = app_state
        .campaign_service
        .create_template(payload, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

// GET /api/templates/{id}
#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Email Campaigns",
    params(("id" = i64, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template", body = EmailTemplate),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let template = app_state.campaign_service.get_template(id).await?;
    Ok(Json(template))
}

// PUT /api/templates/{id}
#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    tag = "Email Campaigns",
    request_body = TemplatePayload,
    params(("id" = i64, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template atualizado", body = EmailTemplate),
        (status = 400, description = "Nome ou assunto ausente"),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let template = app_state.campaign_service.update_template(id, payload).await?;
    Ok(Json(template))
}

// DELETE /api/templates/{id}
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Email Campaigns",
    params(("id" = i64, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template removido", body = DeleteResponse),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.campaign_service.delete_template(id).await?;
    Ok(deleted())
}

// =============================================================================
//  CAMPANHAS
// =============================================================================

// GET /api/campaigns
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Email Campaigns",
    responses(
        (status = 200, description = "Rascunhos de campanha, mais recentes primeiro", body = Vec<EmailCampaign>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_campaigns(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let campaigns = app_state.campaign_service.list_campaigns().await?;
    Ok(Json(campaigns))
}

// POST /api/campaigns
#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Email Campaigns",
    request_body = CampaignPayload,
    responses(
        (status = 201, description = "Rascunho criado com o público contado", body = EmailCampaign),
        (status = 400, description = "Assunto ausente ou template inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_campaign(
    State(app_state): State<AppState>,
    Json(payload): Json<CampaignPayload>,
) -> Result<impl IntoResponse, AppError> {
    let campaign = app_state.campaign_service.create_campaign(payload).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

// GET /api/campaigns/{id}
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "Email Campaigns",
    params(("id" = i64, Path, description = "ID da campanha")),
    responses(
        (status = 200, description = "Campanha com o template", body = CampaignDetail),
        (status = 404, description = "Campanha não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_campaign(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let campaign = app_state.campaign_service.get_campaign(id).await?;
    Ok(Json(campaign))
}

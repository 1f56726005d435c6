//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração ou sem banco a aplicação não deve iniciar
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Definições de campos customizados e seus valores
    let field_routes = Router::new()
        .route("/fields"
               ,get(handlers::fields::list_fields)
               .post(handlers::fields::create_field)
        )
        .route("/fields/types", get(handlers::fields::list_field_types))
        .route("/fields/{id}"
               ,patch(handlers::fields::update_field)
               .delete(handlers::fields::delete_field)
        )
        .route("/field-values"
               ,get(handlers::field_values::get_field_values)
               .put(handlers::field_values::set_field_values)
        );

    let account_routes = Router::new()
        .route("/"
               ,get(handlers::accounts::list_accounts)
               .post(handlers::accounts::create_account)
        )
        // Segmentos literais têm prioridade sobre "/{id}"
        .route("/export", get(handlers::accounts::export_accounts))
        .route("/import/targets", get(handlers::accounts::account_import_targets))
        .route("/import/preview", post(handlers::accounts::preview_account_import))
        .route("/import", post(handlers::accounts::import_accounts))
        .route("/{id}"
               ,get(handlers::accounts::get_account)
               .put(handlers::accounts::update_account)
               .delete(handlers::accounts::delete_account)
        );

    let contact_routes = Router::new()
        .route("/"
               ,get(handlers::contacts::list_contacts)
               .post(handlers::contacts::create_contact)
        )
        .route("/export", get(handlers::contacts::export_contacts))
        .route("/import/targets", get(handlers::contacts::contact_import_targets))
        .route("/import/preview", post(handlers::contacts::preview_contact_import))
        .route("/import", post(handlers::contacts::import_contacts))
        .route("/{id}"
               ,get(handlers::contacts::get_contact)
               .put(handlers::contacts::update_contact)
               .delete(handlers::contacts::delete_contact)
        );

    // Templates e rascunhos de campanha (o envio fica fora deste serviço)
    let campaign_routes = Router::new()
        .route("/templates"
               ,get(handlers::campaigns::list_templates)
               .post(handlers::campaigns::create_template)
        )
        .route("/templates/{id}"
               ,get(handlers::campaigns::get_template)
               .put(handlers::campaigns::update_template)
               .delete(handlers::campaigns::delete_template)
        )
        .route("/campaigns"
               ,get(handlers::campaigns::list_campaigns)
               .post(handlers::campaigns::create_campaign)
        )
        .route("/campaigns/{id}", get(handlers::campaigns::get_campaign));

    // Tudo do CRM exige Bearer válido
    let crm_routes = Router::new()
        .merge(field_routes)
        .merge(campaign_routes)
        .nest("/accounts", account_routes)
        .nest("/contacts", contact_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", crm_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

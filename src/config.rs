// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CampaignRepository, FieldRepository, RecordRepository},
    models::{account::Account, contact::Contact},
    services::{
        auth::AuthService, campaign_service::CampaignService, field_service::FieldService,
        record_service::RecordService, transfer_service::TransferService,
    },
};

/// Configuração lida do ambiente (.env incluso)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub rows_per_page: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", raw))?,
            None => 5,
        };

        let rows_per_page: i64 = match lookup("ROWS_PER_PAGE") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("ROWS_PER_PAGE inválido: '{}'", raw))?,
            None => 50,
        };
        if rows_per_page < 1 {
            anyhow::bail!("ROWS_PER_PAGE deve ser maior que zero");
        }

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            rows_per_page,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub field_service: FieldService,
    pub account_service: RecordService<Account>,
    pub contact_service: RecordService<Contact>,
    pub account_transfer: TransferService<Account>,
    pub contact_transfer: TransferService<Contact>,
    pub campaign_service: CampaignService,
}

impl AppState {
    // A assinatura retorna um Result: sem banco a aplicação não sobe
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let field_service = FieldService::new(Arc::new(FieldRepository::new(db_pool.clone())));

        let account_service = RecordService::new(
            Arc::new(RecordRepository::<Account>::new(db_pool.clone())),
            field_service.clone(),
            config.rows_per_page,
        );
        let contact_service = RecordService::new(
            Arc::new(RecordRepository::<Contact>::new(db_pool.clone())),
            field_service.clone(),
            config.rows_per_page,
        );

        let campaign_service = CampaignService::new(
            Arc::new(CampaignRepository::new(db_pool.clone())),
            contact_service.clone(),
        );

        Self {
            auth_service: AuthService::new(config.jwt_secret.clone()),
            account_transfer: TransferService::new(account_service.clone()),
            contact_transfer: TransferService::new(contact_service.clone()),
            field_service,
            account_service,
            contact_service,
            campaign_service,
            config: Arc::new(config),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.rows_per_page, 50);
    }

    #[test]
    fn required_and_malformed_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "x")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "x"),
            ("ROWS_PER_PAGE", "0"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", "x"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .is_err());
    }
}

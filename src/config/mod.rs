use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Configuration for the service
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Full database connection URL. Takes precedence over the `postgres_*` parts.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub postgres_user: Option<String>,
    #[serde(default)]
    pub postgres_password: Option<String>,
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,
    #[serde(default)]
    pub postgres_db: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    /// Address the HTTP listener binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Browser origins allowed by the CORS policy
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Upper bound applied to the `limit` query parameter
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: u32,
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_max_list_limit() -> u32 {
    1000
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Build the PostgreSQL connection options.
    ///
    /// `DATABASE_URL` wins when set; otherwise the connection is assembled
    /// from the individual `POSTGRES_*` variables.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return Ok(url.parse::<PgConnectOptions>()?);
        }

        let user = self
            .postgres_user
            .as_deref()
            .ok_or_else(|| anyhow!("POSTGRES_USER must be set when DATABASE_URL is not"))?;
        let database = self
            .postgres_db
            .as_deref()
            .ok_or_else(|| anyhow!("POSTGRES_DB must be set when DATABASE_URL is not"))?;

        let mut options = PgConnectOptions::new()
            .host(&self.postgres_host)
            .port(self.postgres_port)
            .username(user)
            .database(database);
        if let Some(password) = &self.postgres_password {
            options = options.password(password);
        }

        Ok(options)
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    let config = Config::load()?;

    Ok(config)
}

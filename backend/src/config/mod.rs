//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! database URLs, server port, token lifetimes and the signing secret.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Deployment profile; drives token lifetimes and test-mode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentEnvironment {
    Local,
    Sandbox,
    Test,
    Production,
}

impl DeploymentEnvironment {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => anyhow::bail!("unknown DEPLOYMENT_ENVIRONMENT: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub readonly_max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub refresh_grace_window: Duration,
    pub deployment_environment: DeploymentEnvironment,
    pub server_port: u16,
    pub smtp_host: Option<String>,
    pub smtp_sender: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        // Read traffic dominates, so the read-only pool defaults larger.
        let readonly_max_connections = env::var("DB_READONLY_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DB_READONLY_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let deployment_environment = DeploymentEnvironment::parse(
            &env::var("DEPLOYMENT_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
        )?;

        // Outside production the access token lasts a day so the API can be
        // exercised by hand without constant renewal.
        let access_token_ttl = match deployment_environment {
            DeploymentEnvironment::Production => Duration::from_secs(5 * 60),
            _ => Duration::from_secs(24 * 60 * 60),
        };

        let refresh_token_ttl = Duration::from_secs(
            env::var("REFRESH_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse::<u64>()
                .context("REFRESH_TOKEN_TTL_SECONDS must be a valid number")?,
        );

        let refresh_grace_window = Duration::from_secs(
            env::var("REFRESH_GRACE_WINDOW_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .context("REFRESH_GRACE_WINDOW_SECONDS must be a valid number")?,
        );

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let smtp_host = env::var("SMTP_HOST").ok();
        let smtp_sender = env::var("SMTP_SENDER").ok();

        Ok(Config {
            database_url,
            max_connections,
            readonly_max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            refresh_grace_window,
            deployment_environment,
            server_port,
            smtp_host,
            smtp_sender,
        })
    }
}

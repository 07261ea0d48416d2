//! Service entrypoint: configuration, pools, event wiring and the HTTP server.

mod api;
mod auth;
mod config;
mod database;
mod domain;
mod errors;
mod events;
mod repositories;
mod services;
mod uow;
mod utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::common::AppContext;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::database::Database;
use crate::domain::event::EventKind;
use crate::events::EventHandlerRegistry;
use crate::events::handlers::{AuditLogHandler, EmailNotificationHandler};
use crate::services::email_service::EmailService;

/// Fixed event wiring: every event is audited; account lifecycle events that
/// concern the account holder are additionally mailed.
fn build_registry(email: Arc<EmailService>) -> EventHandlerRegistry {
    let audit = Arc::new(AuditLogHandler);
    let mailer = Arc::new(EmailNotificationHandler::new(email));

    let mut builder = EventHandlerRegistry::builder();
    for kind in EventKind::ALL {
        builder = builder.on(kind, audit.clone());
    }
    builder
        .on(EventKind::AdminCreated, mailer.clone())
        .on(EventKind::UserPasswordReset, mailer)
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let database = Database::new(&config)
        .await
        .context("failed to connect to database")?;
    database.migrate().await.context("migration failed")?;

    let tokens = Arc::new(TokenService::new(&config));
    let email = Arc::new(EmailService::new(&config));
    let registry = Arc::new(build_registry(email));

    let ctx = AppContext {
        database: database.clone(),
        tokens: tokens.clone(),
        registry,
    };
    let app = api::app_router(ctx, tokens);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    database.close().await;
    Ok(())
}

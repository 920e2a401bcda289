//! Contacts backend entry point: loads settings, prepares storage and serves
//! the REST API.

mod server;

use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use contacts_backend::outbound::persistence::run_pending_migrations;
use server::{AppSettings, PersistenceBackend, ServerConfig, build_http_state, create_server};

async fn migrate(settings: &AppSettings, backend: PersistenceBackend) -> Result<()> {
    if !settings.migrates_on_startup(backend) {
        return Ok(());
    }
    let url = settings.database_url_for(backend)?.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .wrap_err("migration task panicked")??;
    info!(applied, "database schema is up to date");
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load settings")?;
    let backend = settings.persistence()?;
    let config = ServerConfig::from_settings(&settings)?;

    migrate(&settings, backend).await?;
    let http_state = build_http_state(&settings, backend).await?;

    info!(bind_addr = %config.bind_addr(), persistence = %backend, "starting contacts server");
    create_server(http_state, config)?.await?;
    Ok(())
}

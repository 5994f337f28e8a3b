//! Backend entry-point: loads settings, prepares the stores and serves the
//! REST API.

mod server;

use std::env;
use std::net::SocketAddr;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use backend::outbound::security::HmacTokenCodec;
use backend::settings::ServerSettings;
use server::{ServerConfig, create_server};

const ALLOW_EPHEMERAL_SECRET_VAR: &str = "CMS_ALLOW_EPHEMERAL_SECRET";

fn token_codec(settings: &ServerSettings) -> std::io::Result<HmacTokenCodec> {
    match &settings.token_secret {
        Some(secret) => HmacTokenCodec::new(secret.as_bytes())
            .map_err(|e| std::io::Error::other(format!("invalid token secret: {e}"))),
        None => {
            let allow_dev = env::var(ALLOW_EPHEMERAL_SECRET_VAR).ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!("using temporary token signing key (dev only); tokens die with the process");
                Ok(HmacTokenCodec::with_random_key())
            } else {
                Err(std::io::Error::other(
                    "CMS_TOKEN_SECRET is required in release builds",
                ))
            }
        }
    }
}

async fn connect_database(settings: &ServerSettings, url: &str) -> std::io::Result<DbPool> {
    let applied = run_pending_migrations(url)
        .await
        .map_err(|e| std::io::Error::other(format!("database migrations failed: {e}")))?;
    info!(applied, "database migrations up to date");

    let pool_config = PoolConfig::new(url)
        .with_max_size(settings.db_max_connections())
        .with_connection_timeout(settings.db_connect_timeout());
    DbPool::new(pool_config)
        .await
        .map_err(|e| std::io::Error::other(format!("database pool setup failed: {e}")))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr: SocketAddr = settings.bind_addr().parse().map_err(|e| {
        std::io::Error::other(format!("invalid bind address {}: {e}", settings.bind_addr()))
    })?;

    let mut config = ServerConfig::new(bind_addr, token_codec(&settings)?)
        .with_token_ttl(settings.token_ttl())
        .with_bootstrap(settings.bootstrap_plan(cfg!(debug_assertions)));
    match settings.database_url.as_deref() {
        Some(url) => config = config.with_db_pool(connect_database(&settings, url).await?),
        None => warn!("CMS_DATABASE_URL not set; data lives in memory and is lost on exit"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config).await?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

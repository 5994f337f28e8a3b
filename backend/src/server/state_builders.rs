//! Wiring of domain services onto the configured store adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use backend::domain::ports::{CredentialRepository, SectionRepository};
use backend::domain::{CredentialAuthService, SectionService};
use backend::inbound::http::state::HttpState;
use backend::outbound::memory::{InMemoryCredentialRepository, InMemorySectionRepository};
use backend::outbound::persistence::{DieselCredentialRepository, DieselSectionRepository};
use backend::outbound::security::Argon2PasswordHasher;
use tracing::info;

use super::ServerConfig;

fn wire<C, S>(credentials: C, sections: S, config: &ServerConfig) -> HttpState
where
    C: CredentialRepository + 'static,
    S: SectionRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let auth = CredentialAuthService::new(
        Arc::new(credentials),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(config.token_codec.clone()),
        clock.clone(),
    )
    .with_token_ttl(config.token_ttl);
    let sections = Arc::new(SectionService::new(Arc::new(sections), clock));
    HttpState::new(Arc::new(auth), sections.clone(), sections)
}

/// Build handler state over PostgreSQL when a pool is configured, otherwise
/// over process memory.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => {
            info!(store = "postgres", "wiring section and credential stores");
            wire(
                DieselCredentialRepository::new(pool.clone()),
                DieselSectionRepository::new(pool.clone()),
                config,
            )
        }
        None => {
            info!(store = "memory", "wiring section and credential stores");
            wire(
                InMemoryCredentialRepository::new(),
                InMemorySectionRepository::new(),
                config,
            )
        }
    }
}

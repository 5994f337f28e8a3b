//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use backend::domain::{BootstrapPlan, DEFAULT_TOKEN_TTL_HOURS};
use backend::outbound::persistence::DbPool;
use backend::outbound::security::HmacTokenCodec;
use chrono::Duration;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) token_codec: HmacTokenCodec,
    pub(crate) token_ttl: Duration,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) bootstrap: Option<BootstrapPlan>,
}

impl ServerConfig {
    /// Construct a configuration backed by in-memory stores.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, token_codec: HmacTokenCodec) -> Self {
        Self {
            bind_addr,
            token_codec,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            db_pool: None,
            bootstrap: None,
        }
    }

    /// Attach a database connection pool; the Diesel adapters replace the
    /// in-memory stores.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Provision the default admin and sections before accepting traffic.
    #[must_use]
    pub fn with_bootstrap(mut self, plan: Option<BootstrapPlan>) -> Self {
        self.bootstrap = plan;
        self
    }
}

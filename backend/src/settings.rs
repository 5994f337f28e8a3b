//! Runtime settings loaded via OrthoConfig from `CMS_*` environment
//! variables, configuration files and command-line flags.

use std::time::Duration as StdDuration;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::bootstrap::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME};
use crate::domain::{BootstrapPlan, DEFAULT_TOKEN_TTL_HOURS};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Longest token lifetime accepted from configuration.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;
/// Password of the provisioned administrator in debug builds when none is
/// configured.
pub const DEV_ADMIN_PASSWORD: &str = "password123";

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CMS")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    /// Upper bound of pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub db_connect_timeout_secs: Option<u64>,
    /// HMAC secret for bearer tokens, at least 32 bytes.
    pub token_secret: Option<String>,
    /// Hours an issued token stays valid.
    pub token_ttl_hours: Option<i64>,
    /// Skip provisioning the default admin and sections at startup.
    #[ortho_config(default = false)]
    pub skip_bootstrap: bool,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn db_connect_timeout(&self) -> StdDuration {
        StdDuration::from_secs(
            self.db_connect_timeout_secs
                .unwrap_or(DEFAULT_DB_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Token lifetime; non-positive overrides fall back to the default and
    /// large ones are capped at [`MAX_TOKEN_TTL_HOURS`].
    pub fn token_ttl(&self) -> Duration {
        let hours = self
            .token_ttl_hours
            .filter(|hours| *hours > 0)
            .map_or(DEFAULT_TOKEN_TTL_HOURS, |hours| hours.min(MAX_TOKEN_TTL_HOURS));
        Duration::try_hours(hours).unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    /// Startup provisioning, or `None` when disabled.
    ///
    /// `allow_dev_password` permits the well-known development password when
    /// no admin password is configured; otherwise the admin is skipped.
    pub fn bootstrap_plan(&self, allow_dev_password: bool) -> Option<BootstrapPlan> {
        if self.skip_bootstrap {
            return None;
        }
        let admin_password = self
            .admin_password
            .clone()
            .or_else(|| allow_dev_password.then(|| DEV_ADMIN_PASSWORD.to_owned()))
            .map(Zeroizing::new);
        Some(BootstrapPlan {
            admin_name: self
                .admin_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_owned()),
            admin_email: self
                .admin_email
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_owned()),
            admin_password,
            seed_sections: true,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "CMS_BIND_ADDR",
        "CMS_DATABASE_URL",
        "CMS_DB_MAX_CONNECTIONS",
        "CMS_DB_CONNECT_TIMEOUT_SECS",
        "CMS_TOKEN_SECRET",
        "CMS_TOKEN_TTL_HOURS",
        "CMS_SKIP_BOOTSTRAP",
        "CMS_ADMIN_NAME",
        "CMS_ADMIN_EMAIL",
        "CMS_ADMIN_PASSWORD",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("backend")]).expect("config should load")
    }

    fn cleared_except(
        overrides: &[(&'static str, &str)],
    ) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert!(settings.database_url.is_none());
        assert!(settings.token_secret.is_none());
        assert_eq!(settings.token_ttl(), Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
        assert_eq!(settings.db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
        assert!(!settings.skip_bootstrap);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("CMS_BIND_ADDR", "127.0.0.1:8080"),
            ("CMS_DATABASE_URL", "postgres://cms@localhost/cms"),
            ("CMS_TOKEN_TTL_HOURS", "2"),
            ("CMS_SKIP_BOOTSTRAP", "true"),
            ("CMS_DB_CONNECT_TIMEOUT_SECS", "3"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://cms@localhost/cms")
        );
        assert_eq!(settings.token_ttl(), Duration::hours(2));
        assert_eq!(settings.db_connect_timeout(), StdDuration::from_secs(3));
        assert!(settings.bootstrap_plan(true).is_none());
    }

    #[rstest]
    #[case("9223372036854775807", MAX_TOKEN_TTL_HOURS)]
    #[case("0", DEFAULT_TOKEN_TTL_HOURS)]
    #[case("-5", DEFAULT_TOKEN_TTL_HOURS)]
    fn out_of_range_token_ttl_is_bounded(#[case] raw: &str, #[case] hours: i64) {
        let _guard = lock_env(cleared_except(&[("CMS_TOKEN_TTL_HOURS", raw)]));

        assert_eq!(load_from_empty_args().token_ttl(), Duration::hours(hours));
    }

    #[rstest]
    #[case(true, Some(DEV_ADMIN_PASSWORD))]
    #[case(false, None)]
    fn dev_password_only_when_allowed(#[case] allow: bool, #[case] expected: Option<&str>) {
        let _guard = lock_env(cleared_except(&[]));

        let plan = load_from_empty_args()
            .bootstrap_plan(allow)
            .expect("bootstrap enabled");
        assert_eq!(plan.admin_email, DEFAULT_ADMIN_EMAIL);
        assert_eq!(plan.admin_password.as_deref().map(String::as_str), expected);
        assert!(plan.seed_sections);
    }

    #[rstest]
    fn configured_admin_password_wins() {
        let _guard = lock_env(cleared_except(&[
            ("CMS_ADMIN_PASSWORD", "s3cret-admin"),
            ("CMS_ADMIN_EMAIL", "owner@example.com"),
        ]));

        let plan = load_from_empty_args()
            .bootstrap_plan(false)
            .expect("bootstrap enabled");
        assert_eq!(plan.admin_email, "owner@example.com");
        assert_eq!(
            plan.admin_password.as_deref().map(String::as_str),
            Some("s3cret-admin")
        );
    }
}

//! Account registration, sign-in and token checks.
//!
//! [`CredentialAuthService`] implements the [`AuthService`] driving port over
//! a credential store, a password hasher and a token codec. Password hashing
//! runs on the blocking pool so sign-in does not stall the worker thread.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthService, CredentialRepository, CredentialRepositoryError, PasswordHasher, TokenCodec,
    TokenCodecError,
};
use crate::domain::{
    AuthClaims, Error, LoginCredentials, LoginOutcome, PasswordHash, Registration, TokenStatus,
    User, UserCredentials, UserId,
};

/// Default validity window for issued tokens, in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Auth service backed by stored credentials.
#[derive(Clone)]
pub struct CredentialAuthService<R, H, T> {
    credentials: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl<R, H, T> CredentialAuthService<R, H, T> {
    pub fn new(credentials: Arc<R>, hasher: Arc<H>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            hasher,
            tokens,
            clock,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Override the validity window of issued tokens.
    #[must_use]
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }
}

impl<R, H, T> CredentialAuthService<R, H, T>
where
    R: CredentialRepository,
    H: PasswordHasher + 'static,
    T: TokenCodec,
{
    fn map_credentials_error(error: CredentialRepositoryError) -> Error {
        match error {
            CredentialRepositoryError::DuplicateEmail { .. } => Self::email_taken(),
            other => other.into(),
        }
    }

    fn email_taken() -> Error {
        Error::invalid_request("User already exists").with_details(json!({
            "field": "email",
            "code": "email_taken",
        }))
    }

    fn invalid_credentials() -> Error {
        Error::invalid_request(INVALID_CREDENTIALS).with_details(json!({
            "code": "invalid_credentials",
        }))
    }

    async fn run_hasher<F, O>(&self, work: F) -> Result<O, Error>
    where
        F: FnOnce(&H) -> O + Send + 'static,
        O: Send + 'static,
    {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || work(hasher.as_ref()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))
    }

    async fn hash_password(&self, password: &str) -> Result<PasswordHash, Error> {
        let password = Zeroizing::new(password.to_owned());
        self.run_hasher(move |hasher| hasher.hash(password.as_str()))
            .await?
            .map_err(Error::from)
    }

    async fn password_matches(&self, password: &str, hash: PasswordHash) -> Result<bool, Error> {
        let password = Zeroizing::new(password.to_owned());
        self.run_hasher(move |hasher| hasher.verify(password.as_str(), &hash))
            .await?
            .map_err(Error::from)
    }

    fn issue_for(&self, user: User) -> Result<LoginOutcome, Error> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| Error::internal("token expiry is out of range"))?;
        let claims = AuthClaims {
            user_id: *user.id(),
            role: user.role(),
            issued_at,
            expires_at,
        };
        let token = self.tokens.issue(&claims).map_err(Error::from)?;
        Ok(LoginOutcome {
            token,
            user,
            expires_at,
        })
    }
}

#[async_trait]
impl<R, H, T> AuthService for CredentialAuthService<R, H, T>
where
    R: CredentialRepository,
    H: PasswordHasher + 'static,
    T: TokenCodec,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        if self
            .credentials
            .find_by_email(registration.email())
            .await
            .map_err(Self::map_credentials_error)?
            .is_some()
        {
            return Err(Self::email_taken());
        }

        let password_hash = self.hash_password(registration.password()).await?;
        let user = User::new(
            UserId::random(),
            registration.name().clone(),
            registration.email().clone(),
            registration.role(),
            self.clock.utc(),
        );
        self.credentials
            .insert(&UserCredentials {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(Self::map_credentials_error)?;

        info!(user_id = %user.id(), role = %user.role(), "registered user");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let Some(stored) = self
            .credentials
            .find_by_email(credentials.email())
            .await
            .map_err(Self::map_credentials_error)?
        else {
            debug!("login for unknown email");
            return Err(Self::invalid_credentials());
        };

        let UserCredentials {
            user,
            password_hash,
        } = stored;
        if !self
            .password_matches(credentials.password(), password_hash)
            .await?
        {
            warn!(user_id = %user.id(), "login with wrong password");
            return Err(Self::invalid_credentials());
        }

        let outcome = self.issue_for(user)?;
        info!(user_id = %outcome.user.id(), "issued access token");
        Ok(outcome)
    }

    fn inspect(&self, token: &str) -> TokenStatus {
        match self.tokens.decode(token, self.clock.utc()) {
            Ok(claims) => TokenStatus::Valid(claims),
            Err(TokenCodecError::Expired { .. }) => TokenStatus::Expired,
            Err(error) => {
                debug!(%error, "rejected bearer token");
                TokenStatus::Invalid
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;

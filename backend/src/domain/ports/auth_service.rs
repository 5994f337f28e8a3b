//! Driving port for account and token use-cases.
//!
//! Inbound adapters call this port to register, sign in and check bearer
//! tokens without importing persistence or crypto adapters.

use async_trait::async_trait;

use crate::domain::{AuthClaims, Error, LoginCredentials, LoginOutcome, Registration, TokenStatus, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. Fails when the email is already registered.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Check credentials and issue an access token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Classify a presented bearer token.
    fn inspect(&self, token: &str) -> TokenStatus;

    /// Claims for a valid token, or `Forbidden` otherwise.
    fn verify(&self, token: &str) -> Result<AuthClaims, Error> {
        match self.inspect(token) {
            TokenStatus::Valid(claims) => Ok(claims),
            TokenStatus::Expired => Err(Error::forbidden("Token expired")),
            TokenStatus::Invalid => Err(Error::forbidden("Invalid token")),
        }
    }
}

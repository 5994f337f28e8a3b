//! Port abstraction for account persistence.

use async_trait::async_trait;

use crate::domain::{EmailAddress, UserCredentials};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by credential repository adapters.
    pub enum CredentialRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "credential repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError,
            "credential repository query failed: {message}",
        /// Another account already uses the address.
        DuplicateEmail { email: String } => Conflict,
            "an account already exists for {email}",
    }
}

/// Storage for user accounts and their password hashes.
///
/// Emails are stored normalised, so lookups are case-insensitive by
/// construction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with [`CredentialRepositoryError::DuplicateEmail`] when the
    /// address is taken, including when a concurrent insert wins the race.
    async fn insert(&self, credentials: &UserCredentials) -> Result<(), CredentialRepositoryError>;

    /// Fetch an account by email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, CredentialRepositoryError>;
}

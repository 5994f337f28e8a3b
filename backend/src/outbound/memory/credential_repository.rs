//! In-memory `CredentialRepository`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{CredentialRepository, CredentialRepositoryError};
use crate::domain::{EmailAddress, UserCredentials};

/// Accounts keyed by normalised email.
#[derive(Debug, Default)]
pub struct InMemoryCredentialRepository {
    accounts: Mutex<HashMap<String, UserCredentials>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CredentialRepositoryError {
    CredentialRepositoryError::query("credential store lock poisoned")
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn insert(&self, credentials: &UserCredentials) -> Result<(), CredentialRepositoryError> {
        let mut accounts = self.accounts.lock().map_err(|_| poisoned())?;
        let email = credentials.user.email().as_ref();
        if accounts.contains_key(email) {
            return Err(CredentialRepositoryError::duplicate_email(email));
        }
        accounts.insert(email.to_owned(), credentials.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, CredentialRepositoryError> {
        let accounts = self.accounts.lock().map_err(|_| poisoned())?;
        Ok(accounts.get(email.as_ref()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PasswordHash, Role, User, UserId, UserName};
    use crate::test_support::fixture_timestamp;
    use rstest::rstest;

    fn credentials(email: &str) -> UserCredentials {
        UserCredentials {
            user: User::new(
                UserId::random(),
                UserName::new("Ada").expect("name"),
                EmailAddress::new(email).expect("email"),
                Role::Editor,
                fixture_timestamp(),
            ),
            password_hash: PasswordHash::new("$fixture$pw"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn lookups_ignore_email_case() {
        let repo = InMemoryCredentialRepository::new();
        repo.insert(&credentials("ada@example.com"))
            .await
            .expect("insert");

        let found = repo
            .find_by_email(&EmailAddress::new("ADA@Example.com").expect("email"))
            .await
            .expect("lookup");

        assert!(found.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn second_insert_for_an_email_is_rejected() {
        let repo = InMemoryCredentialRepository::new();
        repo.insert(&credentials("ada@example.com"))
            .await
            .expect("first insert");

        let err = repo
            .insert(&credentials("Ada@example.com"))
            .await
            .expect_err("duplicate");

        assert!(matches!(
            err,
            CredentialRepositoryError::DuplicateEmail { .. }
        ));
    }
}

//! PostgreSQL-backed `CredentialRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{CredentialRepository, CredentialRepositoryError};
use crate::domain::{
    EmailAddress, PasswordHash, Role, User, UserCredentials, UserId, UserName,
};

use super::diesel_error_mapping::{is_unique_violation, map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `CredentialRepository` port.
///
/// The `users.email` unique index settles registration races: the losing
/// insert reports [`CredentialRepositoryError::DuplicateEmail`].
#[derive(Clone)]
pub struct DieselCredentialRepository {
    pool: DbPool,
}

impl DieselCredentialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CredentialRepositoryError {
    map_basic_pool_error(error, CredentialRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CredentialRepositoryError {
    map_basic_diesel_error(
        error,
        CredentialRepositoryError::query,
        CredentialRepositoryError::connection,
    )
}

fn row_to_credentials(row: UserRow) -> Result<UserCredentials, CredentialRepositoryError> {
    let corrupt = |field: &str, err: &dyn std::fmt::Display| {
        warn!(user_id = %row.id, field, %err, "stored user row failed validation");
        CredentialRepositoryError::query(format!("stored user {} has invalid {field}", row.id))
    };

    let name = UserName::new(&row.name).map_err(|err| corrupt("name", &err))?;
    let email = EmailAddress::new(&row.email).map_err(|err| corrupt("email", &err))?;
    let role = row
        .role
        .parse::<Role>()
        .map_err(|err| corrupt("role", &err))?;

    Ok(UserCredentials {
        user: User::new(UserId::from_uuid(row.id), name, email, role, row.created_at),
        password_hash: PasswordHash::new(row.password_hash),
    })
}

#[async_trait]
impl CredentialRepository for DieselCredentialRepository {
    async fn insert(&self, credentials: &UserCredentials) -> Result<(), CredentialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = &credentials.user;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            name: user.name().as_ref(),
            email: user.email().as_ref(),
            password_hash: credentials.password_hash.as_str(),
            role: user.role().as_str(),
            created_at: user.created_at(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    CredentialRepositoryError::duplicate_email(user.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, CredentialRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_credentials).transpose()
    }
}

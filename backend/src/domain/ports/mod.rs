//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod credential_repository;
mod password_hasher;
mod section_command;
mod section_query;
mod section_repository;
mod token_codec;

pub use auth_service::AuthService;
#[cfg(test)]
pub use auth_service::MockAuthService;
#[cfg(test)]
pub use credential_repository::MockCredentialRepository;
pub use credential_repository::{CredentialRepository, CredentialRepositoryError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{FixturePasswordHasher, PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use section_command::MockSectionCommand;
pub use section_command::SectionCommand;
#[cfg(test)]
pub use section_query::MockSectionQuery;
pub use section_query::SectionQuery;
#[cfg(test)]
pub use section_repository::MockSectionRepository;
pub use section_repository::{SectionRepository, SectionRepositoryError};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenCodecError};

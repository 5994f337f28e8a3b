//! Process-local adapters for running without PostgreSQL.
//!
//! State lives behind a mutex and disappears with the process. The section
//! store commits a change set by staging it on a copy, so a rejected batch
//! leaves nothing behind.

mod credential_repository;
mod section_repository;

pub use credential_repository::InMemoryCredentialRepository;
pub use section_repository::InMemorySectionRepository;

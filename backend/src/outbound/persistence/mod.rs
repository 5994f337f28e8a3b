//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` with `bb8` pooling.
//!
//! - Repository implementations only translate between Diesel rows and
//!   domain types; ordering rules live in the domain.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) never
//!   leave this module.
//! - Database failures are mapped to the owning port's error type.
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselSectionRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/cms")).await?;
//! let sections = DieselSectionRepository::new(pool);
//! ```

mod diesel_credential_repository;
mod diesel_error_mapping;
mod diesel_section_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_credential_repository::DieselCredentialRepository;
pub use diesel_section_repository::DieselSectionRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

//! Domain primitives, services and ports.
//!
//! Purpose: define the section and account model, the ordering rules that
//! keep sections densely numbered, and the services the inbound adapters
//! drive. Nothing here depends on HTTP or on a particular store.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Role, EmailAddress: accounts that can sign in.
//! - Section and its change types: ordered page blocks.
//! - CredentialAuthService, SectionService, Bootstrapper: use-case services.

pub mod auth;
pub mod auth_service;
pub mod bootstrap;
pub mod error;
pub mod ports;
pub mod section;
pub mod section_order;
pub mod section_service;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AccessToken, AuthClaims, AuthValidationError, LoginCredentials, LoginOutcome, PasswordHash,
    Registration, TokenStatus, UserCredentials,
};
pub use self::auth_service::{CredentialAuthService, DEFAULT_TOKEN_TTL_HOURS};
pub use self::bootstrap::{BootstrapOutcome, BootstrapPlan, Bootstrapper};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::section::{
    NewSection, Section, SectionChangeSet, SectionId, SectionName, SectionPatch,
    SectionRemoval, SectionReplacement, SectionValidationError, SectionWrite,
};
pub use self::section_service::SectionService;
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, Role, User, UserId, UserName, UserValidationError};

/// HTTP header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

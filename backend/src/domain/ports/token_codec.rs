//! Port for signing and reading bearer tokens.

use chrono::{DateTime, Utc};

use crate::domain::{AccessToken, AuthClaims};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codec adapters.
    pub enum TokenCodecError {
        /// The token is not a well-formed compact token.
        Malformed { message: String } => Forbidden, "token is malformed: {message}",
        /// The signature does not match the payload.
        BadSignature => Forbidden, "token signature is invalid",
        /// The token's validity window has closed.
        Expired { expired_at: DateTime<Utc> } => Forbidden, "token expired at {expired_at}",
        /// Claims could not be encoded.
        Encoding { message: String } => InternalError, "token encoding failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign `claims` into a compact token.
    fn issue(&self, claims: &AuthClaims) -> Result<AccessToken, TokenCodecError>;

    /// Check the signature and expiry of `token` as of `now`.
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<AuthClaims, TokenCodecError>;
}

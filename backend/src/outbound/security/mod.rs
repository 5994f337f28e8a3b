//! Password hashing and token signing adapters.

mod argon2_password_hasher;
mod hmac_token_codec;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use hmac_token_codec::{HmacTokenCodec, MIN_SECRET_LEN};

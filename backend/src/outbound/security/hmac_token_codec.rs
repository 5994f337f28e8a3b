//! HMAC-SHA256 signed bearer tokens.
//!
//! Tokens use the three-segment compact layout `header.claims.signature`,
//! each segment base64url without padding. The header is fixed to
//! `{"alg":"HS256","typ":"JWT"}`; claims carry `sub`, `role`, `iat` and `exp`
//! in Unix seconds.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{TokenCodec, TokenCodecError};
use crate::domain::{AccessToken, AuthClaims, Role, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Signs and checks tokens with a shared secret.
#[derive(Clone)]
pub struct HmacTokenCodec {
    key: Zeroizing<Vec<u8>>,
}

impl HmacTokenCodec {
    /// Codec keyed by `secret`.
    ///
    /// # Errors
    ///
    /// Rejects secrets shorter than [`MIN_SECRET_LEN`].
    pub fn new(secret: &[u8]) -> Result<Self, TokenCodecError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenCodecError::encoding(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self {
            key: Zeroizing::new(secret.to_vec()),
        })
    }

    /// Codec keyed by a fresh random secret; tokens die with the process.
    pub fn with_random_key() -> Self {
        let mut key = Zeroizing::new(vec![0_u8; MIN_SECRET_LEN]);
        rand::thread_rng().fill_bytes(key.as_mut_slice());
        Self { key }
    }

    fn mac(&self) -> Result<HmacSha256, TokenCodecError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|err| TokenCodecError::encoding(err.to_string()))
    }

    fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenCodecError> {
        let json =
            serde_json::to_vec(value).map_err(|err| TokenCodecError::encoding(err.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode_segment<T: for<'de> Deserialize<'de>>(
        segment: &str,
        what: &str,
    ) -> Result<T, TokenCodecError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| TokenCodecError::malformed(format!("{what} is not base64url")))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| TokenCodecError::malformed(format!("{what} is not valid JSON")))
    }
}

fn timestamp(seconds: i64, what: &str) -> Result<DateTime<Utc>, TokenCodecError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenCodecError::malformed(format!("{what} is out of range")))
}

impl TokenCodec for HmacTokenCodec {
    fn issue(&self, claims: &AuthClaims) -> Result<AccessToken, TokenCodecError> {
        let header = Self::encode_segment(&Header {
            alg: ALGORITHM.to_owned(),
            typ: "JWT".to_owned(),
        })?;
        let payload = Self::encode_segment(&WireClaims {
            sub: *claims.user_id.as_uuid(),
            role: claims.role,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        })?;
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(AccessToken::new(format!("{signing_input}.{signature}")))
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<AuthClaims, TokenCodecError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenCodecError::malformed("expected three segments"));
        };

        let parsed: Header = Self::decode_segment(header, "header")?;
        if parsed.alg != ALGORITHM {
            return Err(TokenCodecError::malformed(format!(
                "unsupported algorithm {}",
                parsed.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenCodecError::malformed("signature is not base64url"))?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenCodecError::bad_signature())?;

        let wire: WireClaims = Self::decode_segment(payload, "claims")?;
        let claims = AuthClaims {
            user_id: UserId::from_uuid(wire.sub),
            role: wire.role,
            issued_at: timestamp(wire.iat, "iat")?,
            expires_at: timestamp(wire.exp, "exp")?,
        };
        if claims.is_expired_at(now) {
            return Err(TokenCodecError::expired(claims.expires_at));
        }
        Ok(claims)
    }
}

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;

use chirpy_types::api::Claims;

use crate::error::{AuthError, Result};

pub const ISSUER: &str = "chirpy";

/// Upper bound on access-token lifetime; also the lifetime used when none is asked for.
pub const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;

const REFRESH_TOKEN_BYTES: usize = 32;

/// 0 or anything above an hour becomes an hour.
pub fn clamp_ttl(ttl_secs: u64) -> u64 {
    if ttl_secs == 0 || ttl_secs > MAX_ACCESS_TOKEN_TTL_SECS {
        MAX_ACCESS_TOKEN_TTL_SECS
    } else {
        ttl_secs
    }
}

/// Signs and verifies HS256 access tokens with the server secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue_access_token(&self, user_id: u64, ttl_secs: u64) -> Result<String> {
        self.issue_access_token_at(user_id, ttl_secs, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        user_id: u64,
        ttl_secs: u64,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat,
            exp: iat + clamp_ttl(ttl_secs) as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature and expiry, then return the user id in the subject.
    pub fn verify_access_token(&self, token: &str) -> Result<u64> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::Expired,
                JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed(e.to_string()),
            }
        })?;

        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::Malformed(format!("subject {:?} is not a user id", data.claims.sub)))
    }
}

/// 32 random bytes from the thread-local CSPRNG, hex-encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

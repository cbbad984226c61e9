use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

const INVALID_TOKEN: &str = "invalid or expired token";

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Username of the token holder.
    pub username: String,
    /// Admin flag copied from the user at issuance time.
    /// Absent or non-boolean values read as `false`.
    #[serde(default, deserialize_with = "admin_flag")]
    pub is_admin: bool,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

fn admin_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(matches!(value, serde_json::Value::Bool(true)))
}

/// Reads the admin claim, failing closed.
pub fn is_admin(claims: &Claims) -> bool {
    claims.is_admin
}

/// Issues and validates HS256-signed access tokens.
///
/// The signing secret is handed over once at construction and never re-read.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Signs `{username, is_admin, exp = now + ttl}`.
    pub fn issue(&self, username: &str, is_admin: bool) -> Result<String, AppError> {
        let exp = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Signing("token lifetime out of range".into()))?;
        let claims = Claims {
            username: username.to_string(),
            is_admin,
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Signing(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature, algorithm and expiry. Every failure is the same
    /// `InvalidToken` to the caller.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("token rejected: {}", e);
                AppError::InvalidToken(INVALID_TOKEN.into())
            })?;

        // The decoder accepts a token in its expiry second; we do not.
        if claims.exp <= Utc::now().timestamp() {
            log::debug!("token for '{}' rejected: expired", claims.username);
            return Err(AppError::InvalidToken(INVALID_TOKEN.into()));
        }

        Ok(claims)
    }
}

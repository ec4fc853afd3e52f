//! Admin password check and signed session tokens.
//!
//! Tokens are HS256 JWTs carrying [`Claims`].

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub struct AdminAuth {
    password_hash: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AdminAuth {
    pub fn new(password_hash: impl Into<String>, secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            password_hash: password_hash.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// A secret for processes started without one. Tokens die with the process.
    pub fn random_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    pub async fn login(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let hash = self.password_hash.clone();

        // bcrypt is CPU bound.
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password check panicked: {e}")))?
            .map_err(|e| AuthError::Internal(format!("bad admin password hash: {e}")))?;

        if !valid {
            return Err(AuthError::InvalidPassword);
        }

        self.issue_at(Utc::now().timestamp())
    }

    pub fn issue_at(&self, iat: i64) -> Result<String, AuthError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| AuthError::Internal("token lifetime out of range".to_string()))?;

        let claims = Claims {
            admin: true,
            iat,
            exp,
            jti: Uuid::new_v4().simple().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token encoding: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token.trim(), &self.decoding, &validation).map_err(|e| {
            AuthError::InvalidToken(match e.kind() {
                ErrorKind::ExpiredSignature => "expired",
                ErrorKind::InvalidSignature => "bad signature",
                ErrorKind::InvalidAlgorithm => "unsupported algorithm",
                _ => "malformed",
            })
        })?;

        if !data.claims.admin {
            return Err(AuthError::InvalidToken("not an admin token"));
        }

        Ok(data.claims)
    }
}

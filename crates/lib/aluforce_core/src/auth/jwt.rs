//! Session token issuance and verification (HS256).

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use super::AuthError;
use crate::config::{MAX_TOKEN_TTL_SECS, TokenSettings};
use crate::models::auth::{TokenClaims, User};

/// Why a presented token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token audience mismatch")]
    InvalidAudience,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Signs and verifies session tokens with a single shared secret.
///
/// Signature is checked before expiry and audience, so claims of a token
/// signed with another secret are never trusted.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    audience: String,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        let secret = settings.secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            audience: settings.audience.clone(),
            ttl: Duration::try_seconds(settings.ttl_secs)
                .unwrap_or_else(|| Duration::seconds(MAX_TOKEN_TTL_SECS)),
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    fn claims_for(
        &self,
        user_id: i64,
        email: &str,
        name: Option<&str>,
        role: &str,
        device_id: &str,
    ) -> Result<TokenClaims, AuthError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AuthError::Internal(format!(
                "token lifetime of {}s overflows the clock",
                self.ttl.num_seconds()
            ))
        })?;
        Ok(TokenClaims {
            id: user_id,
            name: name.map(str::to_string),
            email: email.to_string(),
            role: role.to_string(),
            device_id: device_id.to_string(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        })
    }

    /// Issue a token for `user` bound to `device_id`.
    pub fn issue(&self, user: &User, device_id: &str) -> Result<IssuedToken, AuthError> {
        let claims = self.claims_for(
            user.id,
            &user.email,
            user.name.as_deref(),
            &user.role,
            device_id,
        )?;
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Issue a token from individual identity fields.
    pub fn issue_token(
        &self,
        user_id: i64,
        email: &str,
        name: Option<&str>,
        role: &str,
        device_id: &str,
    ) -> Result<String, AuthError> {
        let claims = self.claims_for(user_id, email, name, role, device_id)?;
        self.sign(&claims)
    }

    /// Verify a token, returning its claims on success.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }
}

//! Signed bearer tokens (HS256 JWT) with a process-local revocation list.
//!
//! Tokens are self-contained: nothing is recorded at issuance. The only
//! server-side state is the set of revoked `jti`s, consulted on every
//! verification *after* the signature and expiry checks so that forged
//! tokens can never be used to learn which ids are revoked.

use std::sync::Arc;

use base64::Engine;
use dashmap::DashSet;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use crate::models::user::User;

/// Validity window applied at issuance: 10 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 600;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("failed to sign token: {0}")]
    SigningError(String),

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,
}

/// Fields embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub name: String,
    pub role: String,
    /// Expiration (unix seconds).
    pub exp: u64,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Unique per issuance; the revocation key.
    pub jti: String,
}

/// Identity snapshot carried by a verified token.
///
/// Reflects the user as they were at issuance, not a live lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.user_id,
            name: c.name,
            role: c.role,
        }
    }
}

pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
    revoked: DashSet<String>,
}

impl TokenManager {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self::with_clock(secret, ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &[u8], ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        // Expiry is checked against our own clock after the signature,
        // so the library only enforces algorithm, signature and `exp` presence.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
            clock,
            revoked: DashSet::new(),
        }
    }

    /// Mint a signed token for `user`, valid for the configured window.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = self.clock.now();
        let claims = Claims {
            user_id: user.id.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            exp: now.saturating_add(self.ttl_secs),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningError(e.to_string()))?;

        tracing::debug!(user_id = %claims.user_id, jti = %claims.jti, exp = claims.exp, "issued token");
        Ok(token)
    }

    /// Verify a raw token string (no `Bearer ` prefix).
    ///
    /// Order: structure, algorithm + signature, expiry, revocation.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.authenticate(token)?;

        if self.clock.now() >= claims.exp {
            return Err(AuthError::Expired);
        }

        if self.revoked.contains(&claims.jti) {
            tracing::debug!(jti = %claims.jti, "rejected revoked token");
            return Err(AuthError::Revoked);
        }

        Ok(claims.into())
    }

    /// Add the token's `jti` to the revocation set.
    ///
    /// The token must be authentic; expired tokens are accepted.
    /// Revoking twice is a no-op.
    pub fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.authenticate(token)?;
        if self.revoked.insert(claims.jti.clone()) {
            tracing::info!(jti = %claims.jti, user_id = %claims.user_id, "token revoked");
        } else {
            tracing::debug!(jti = %claims.jti, "token already revoked");
        }
        Ok(())
    }

    /// Currently revoked token ids, sorted.
    pub fn list_revoked(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.revoked.iter().map(|j| j.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Structural, algorithm and signature checks. Returns the decoded claims.
    fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        match decode_header(token) {
            Ok(header) if header.alg != ALGORITHM => {
                tracing::warn!(alg = ?header.alg, "rejected token with unexpected algorithm");
                return Err(AuthError::SignatureInvalid);
            }
            Ok(_) => {}
            // Algorithms the library cannot name (e.g. "none") still declare one.
            Err(_) => {
                return Err(match declared_alg(token) {
                    Some(alg) if alg.parse::<Algorithm>().ok() != Some(ALGORITHM) => {
                        tracing::warn!(alg = %alg, "rejected token with unsupported algorithm");
                        AuthError::SignatureInvalid
                    }
                    _ => AuthError::MalformedToken,
                });
            }
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::SignatureInvalid
                }
                _ => AuthError::MalformedToken,
            })
    }
}

/// Read the `alg` field from the JOSE header without trusting anything else.
fn declared_alg(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header_bytes = engine.decode(parts[0]).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&header_bytes).ok()?;
    header.get("alg").and_then(|v| v.as_str()).map(String::from)
}

// ── Tests ────────────────────────────────────────────────────

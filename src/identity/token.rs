use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::error::AppError;

use super::claims::Claims;
use super::principal::Identity;

/// Internal token-failure taxonomy. Everything except `KeyUnavailable`
/// collapses to a single Forbidden at the API boundary; the distinction
/// exists for logging only, never for response shape.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token malformed")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("signing key unavailable")]
    KeyUnavailable,
}

/// RSA key material, decoded once per process and shared read-only across
/// requests. A key that fails to decode is fatal, not retryable.
pub struct TokenKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl TokenKeys {
    /// Build from PEM material. The private key may be absent for
    /// verify-only deployments; issuing then fails with `KeyUnavailable`.
    pub fn from_rsa_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding = if private_pem.is_empty() {
            None
        } else {
            Some(EncodingKey::from_rsa_pem(private_pem).map_err(|_| TokenError::KeyUnavailable)?)
        };
        let decoding =
            DecodingKey::from_rsa_pem(public_pem).map_err(|_| TokenError::KeyUnavailable)?;
        Ok(Self { encoding, decoding })
    }
}

/// Issues signed, time-bounded access tokens. Pure function of the identity,
/// the clock and the key material; no side effects.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<TokenKeys>,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(keys: Arc<TokenKeys>, ttl_secs: u64) -> Self {
        Self { keys, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Snapshot the identity's loaded role grants into claims and sign them.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_claims(&Claims::for_identity(identity, self.ttl_secs))
    }

    pub fn issue_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        let key = self.keys.encoding.as_ref().ok_or(TokenError::KeyUnavailable)?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS512), claims, key)
            .map_err(|_| TokenError::KeyUnavailable)
    }
}

/// Validates signed tokens and reconstructs their claims.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<TokenKeys>,
}

impl TokenVerifier {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    /// Validate signature and expiry and decode the claims. The accepted
    /// algorithm is pinned to RS512 so a token signed with a different
    /// scheme is rejected outright. Expiry has zero leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS512);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.keys.decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })?;
        Ok(data.claims)
    }

    /// Validate a bearer token taken from an `Authorization` header value of
    /// the form `"<scheme> <token>"`. A missing or malformed header is a
    /// BadRequest-class failure; an invalid or expired token is
    /// Forbidden-class. The two stay distinguishable to the caller.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims, AppError> {
        let header = header.ok_or_else(|| {
            AppError::bad_request("missing_authorization", "Authorization header required")
        })?;
        let mut parts = header.split_whitespace();
        let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) => (scheme, token),
            _ => {
                return Err(AppError::bad_request(
                    "bad_authorization",
                    "expected '<scheme> <token>'",
                ))
            }
        };
        if !scheme.eq_ignore_ascii_case("Bearer") {
            return Err(AppError::bad_request("bad_authorization", "unsupported scheme"));
        }
        self.verify(token).map_err(|e| {
            debug!(reason = %e, "rejecting bearer token");
            AppError::forbidden("invalid_token", "token rejected")
        })
    }
}

//! Service configuration loaded from the environment.
//! The value is constructed once in `main` and passed into each component's
//! constructor; nothing in the crate reaches for ambient global state.

use anyhow::{anyhow, Result};
use base64::Engine;

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECS: u64 = 4 * 3600;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
    /// Lifetime of an issued access token, in seconds.
    pub token_ttl_secs: u64,
    /// RSA signing key, PEM. Empty when the deployment is verify-only.
    pub jwt_private_key_pem: Vec<u8>,
    /// RSA verification key, PEM.
    pub jwt_public_key_pem: Vec<u8>,
}

/// Key env vars carry either raw PEM or base64-wrapped PEM; deployments wrap
/// them to survive env-file round trips. Try the wrapped form first.
fn decode_key_material(raw: &str) -> Vec<u8> {
    match base64::engine::general_purpose::STANDARD.decode(raw.trim()) {
        Ok(bytes) => bytes,
        Err(_) => raw.as_bytes().to_vec(),
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let http_port = match std::env::var("PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow!("PORT must be a port number: {e}"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };
        let token_ttl_secs = match std::env::var("JWT_EXPIRATION_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|e| anyhow!("JWT_EXPIRATION_SECS must be seconds: {e}"))?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };
        let jwt_private_key_pem = std::env::var("OAUTH_JWT_PRIVATE_KEY")
            .map(|v| decode_key_material(&v))
            .unwrap_or_default();
        let jwt_public_key_pem = std::env::var("OAUTH_JWT_PUBLIC_KEY")
            .map(|v| decode_key_material(&v))
            .unwrap_or_default();
        Ok(Self { http_port, token_ttl_secs, jwt_private_key_pem, jwt_public_key_pem })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_wrapped_pem_is_unwrapped() {
        let pem = "-----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----";
        let wrapped = base64::engine::general_purpose::STANDARD.encode(pem);
        assert_eq!(decode_key_material(&wrapped), pem.as_bytes());
    }

    #[test]
    fn raw_pem_passes_through() {
        let pem = "-----BEGIN RSA PUBLIC KEY-----"; // '-' is not base64
        assert_eq!(decode_key_material(pem), pem.as_bytes());
    }
}

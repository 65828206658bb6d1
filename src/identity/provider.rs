use argon2::{Argon2, PasswordVerifier};
use password_hash::PasswordHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::authorizer::Directory;
use super::roles::RoleGrant;
use super::token::TokenIssuer;

/// Compare a presented secret against a stored PHC hash. A malformed stored
/// hash and a mismatch both return false; the caller cannot tell them apart.
/// The plaintext is never stored or logged.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The token grant response: the signed JWT plus its lifetime and the
/// permission snapshot it carries, for client display.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub permissions: BTreeMap<u64, Vec<RoleGrant>>,
}

/// The login path: resolve the identity, check the password, load the role
/// grants and issue a signed token. An unknown email and a wrong password
/// produce the identical error, so callers cannot enumerate accounts.
pub fn login(
    dir: &dyn Directory,
    issuer: &TokenIssuer,
    req: &LoginRequest,
) -> AppResult<LoginResponse> {
    let invalid = || AppError::auth("invalid_credentials", "email/password did not match");

    let mut identity = match dir.find_identity_by_email(&req.email) {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            debug!(email = %req.email, "login for unknown email");
            return Err(invalid());
        }
        Err(e) => return Err(AppError::internal("store_error".into(), e.to_string())),
    };
    if !verify_password(&identity.password_hash, &req.password) {
        debug!(email = %req.email, "password mismatch");
        return Err(invalid());
    }

    // Authenticated. Fetch the grants that go into the token.
    let permissions = identity
        .load_roles(dir)
        .map_err(|e| AppError::internal("store_error".into(), e.to_string()))?
        .clone();

    let access_token = issuer.issue(&identity).map_err(|e| {
        tracing::error!(error = %e, "failed to sign access token");
        AppError::internal("key_unavailable", "could not sign token")
    })?;

    Ok(LoginResponse { access_token, expires_in: issuer.ttl_secs(), permissions })
}

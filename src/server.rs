//!
//! volunteer-savvy HTTP server
//! ---------------------------
//! Axum-based HTTP API for the volunteer-coordination backend.
//!
//! Responsibilities:
//! - Token grant endpoint backed by the `identity` module (Basic credentials
//!   in, signed JWT out).
//! - Roster endpoint restricted to the caller's organizations.
//! - Site read endpoints built on the flat-row collation engine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::identity::{
    self, LoginRequest, RequestContext, TokenIssuer, TokenKeys, TokenVerifier,
};
use crate::sites::{collate_sites, SiteStore};
use crate::store::MemoryStore;

/// Shared server state injected into all handlers. The key material is
/// decoded once at startup and shared read-only; the store handle is
/// internally synchronized.
#[derive(Clone)]
pub struct AppState {
    pub store: MemoryStore,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "volunteer-savvy ok" }))
        .route("/auth/token", post(grant_token))
        .route("/users", get(list_users))
        .route("/sites", get(list_sites))
        .route("/sites/{slug}", get(describe_site))
        .with_state(state)
}

/// Start the HTTP server. Key material that fails to decode is fatal here,
/// at startup, rather than surfacing per-request.
pub async fn run(config: ServiceConfig, store: MemoryStore) -> anyhow::Result<()> {
    let keys = TokenKeys::from_rsa_pem(&config.jwt_private_key_pem, &config.jwt_public_key_pem)
        .map_err(|e| anyhow::anyhow!("JWT key material unusable: {e}"))?;
    let keys = Arc::new(keys);
    let state = AppState {
        store,
        issuer: TokenIssuer::new(keys.clone(), config.token_ttl_secs),
        verifier: TokenVerifier::new(keys),
    };

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn error_response(e: AppError) -> (StatusCode, Json<serde_json::Value>) {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!(e)))
}

/// Pull email/password out of an HTTP Basic `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Option<LoginRequest> {
    let header = headers.get("authorization")?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ").or_else(|| header.strip_prefix("basic "))?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some(LoginRequest { email: email.to_string(), password: password.to_string() })
}

fn bearer_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("authorization").and_then(|v| v.to_str().ok())
}

/// User login. Returns a signed JWT carrying the org->role claim snapshot.
async fn grant_token(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(req) = basic_credentials(&headers) else {
        debug!("no basic auth included");
        return error_response(AppError::auth("invalid_credentials", "basic auth required"));
    };
    match identity::login(&state.store, &state.issuer, &req) {
        Ok(resp) => (StatusCode::OK, Json(json!(resp))),
        Err(e) => {
            if matches!(e, AppError::Internal { .. }) {
                error!(error = %e, "token grant failed");
            }
            error_response(e)
        }
    }
}

/// Roster of identities sharing at least one organization with the caller.
async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = match state.verifier.verify_bearer(bearer_header(&headers)) {
        Ok(claims) => RequestContext::authenticated(claims),
        Err(e) => return error_response(e),
    };
    let Some(claims) = ctx.claims.as_ref() else {
        return error_response(AppError::forbidden("invalid_token", "no claims on request"));
    };
    match identity::visible_identities(claims, &state.store) {
        Ok(users) => (StatusCode::OK, Json(json!(users))),
        Err(e) => {
            error!(error = %e, "failed to list visible users");
            error_response(AppError::internal("store_error", "failed to list users"))
        }
    }
}

async fn list_sites(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(e) = state.verifier.verify_bearer(bearer_header(&headers)) {
        return error_response(e);
    }
    match state.store.select_joined_site_rows(None) {
        Ok(rows) => (StatusCode::OK, Json(json!(collate_sites(rows)))),
        Err(e) => {
            error!(error = %e, "failed to select site rows");
            error_response(AppError::internal("store_error", "failed to list sites"))
        }
    }
}

async fn describe_site(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = state.verifier.verify_bearer(bearer_header(&headers)) {
        return error_response(e);
    }
    match state.store.select_joined_site_rows(Some(&slug)) {
        Ok(rows) => {
            let mut sites = collate_sites(rows);
            match sites.pop() {
                Some(site) => (StatusCode::OK, Json(json!(site))),
                None => error_response(AppError::not_found("no_site", "no site with that slug")),
            }
        }
        Err(e) => {
            error!(error = %e, "failed to select site rows");
            error_response(AppError::internal("store_error", "failed to describe site"))
        }
    }
}

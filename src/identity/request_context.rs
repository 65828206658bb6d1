use super::Claims;

/// Request-scoped context carried by parameter through the request's
/// processing. Typed fields instead of string-keyed attribute lookups.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub claims: Option<Claims>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn authenticated(claims: Claims) -> Self {
        Self { claims: Some(claims), request_id: None }
    }
}

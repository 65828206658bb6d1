//! Identity, role grants, signed access tokens and roster visibility.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod claims;
mod principal;
mod provider;
mod request_context;
mod roles;
mod token;

pub use authorizer::{visible_identities, Directory};
pub use claims::Claims;
pub use principal::Identity;
pub use provider::{login, verify_password, LoginRequest, LoginResponse};
pub use request_context::RequestContext;
pub use roles::{RoleGrant, RoleKind};
pub use token::{TokenError, TokenIssuer, TokenKeys, TokenVerifier};

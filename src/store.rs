//! In-memory store implementing the persistence traits. The real deployment
//! owns a relational pool behind the same seams; this backing serves the
//! standalone binary and the integration tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher};
use parking_lot::RwLock;
use password_hash::SaltString;

use crate::identity::{Directory, Identity, RoleGrant, RoleKind};
use crate::sites::{SiteRow, SiteStore};

/// Produce an argon2 PHC string for a new password.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();
    Ok(phc)
}

#[derive(Default)]
struct Inner {
    identities: Vec<Identity>,
    grants: Vec<RoleGrant>,
    site_rows: Vec<SiteRow>,
}

/// Cloneable shared handle over the in-memory tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identity(&self, guid: &str, email: &str, password: &str) -> Result<()> {
        let mut identity = Identity::new(guid, email);
        identity.password_hash = hash_password(password)?;
        let mut inner = self.inner.write();
        inner.identities.retain(|u| u.guid != guid);
        inner.identities.push(identity);
        Ok(())
    }

    pub fn grant_role(&self, org_id: u64, user_guid: &str, kind: RoleKind) {
        let mut inner = self.inner.write();
        inner.grants.push(RoleGrant { org_id, user_guid: user_guid.to_string(), kind });
    }

    pub fn add_site_rows(&self, rows: Vec<SiteRow>) {
        self.inner.write().site_rows.extend(rows);
    }
}

impl Directory for MemoryStore {
    fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let inner = self.inner.read();
        Ok(inner.identities.iter().find(|u| u.email == email).cloned())
    }

    fn find_role_grants(&self, user_guid: &str) -> Result<Vec<RoleGrant>> {
        let inner = self.inner.read();
        Ok(inner.grants.iter().filter(|g| g.user_guid == user_guid).cloned().collect())
    }

    fn find_identities_by_org_set(&self, org_ids: &BTreeSet<u64>) -> Result<Vec<Identity>> {
        let inner = self.inner.read();
        // Mirrors the join: one row per (identity, matching grant).
        let mut out = Vec::new();
        for grant in inner.grants.iter().filter(|g| org_ids.contains(&g.org_id)) {
            if let Some(user) = inner.identities.iter().find(|u| u.guid == grant.user_guid) {
                out.push(Identity::new(user.guid.clone(), user.email.clone()));
            }
        }
        Ok(out)
    }
}

impl SiteStore for MemoryStore {
    fn select_joined_site_rows(&self, slug: Option<&str>) -> Result<Vec<SiteRow>> {
        let inner = self.inner.read();
        Ok(inner
            .site_rows
            .iter()
            .filter(|r| slug.map(|s| r.slug == s).unwrap_or(true))
            .cloned()
            .collect())
    }
}

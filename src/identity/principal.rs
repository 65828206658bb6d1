use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::authorizer::Directory;
use super::roles::RoleGrant;

/// A stored identity. The password hash never serializes; role grants are
/// resolved lazily and cached on the instance for the rest of the request,
/// so repeated resolution cannot silently double-query the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    #[serde(rename = "user_guid")]
    pub guid: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    /// Grants grouped by organization id. `None` means not yet loaded;
    /// `Some` with an empty map means loaded and the identity has no grants.
    #[serde(rename = "roles", skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeMap<u64, Vec<RoleGrant>>>,
}

impl Identity {
    pub fn new(guid: impl Into<String>, email: impl Into<String>) -> Self {
        Self { guid: guid.into(), email: email.into(), ..Default::default() }
    }

    /// Fetch and cache this identity's role grants, grouped by organization.
    /// A second call returns the cached map without touching the store.
    pub fn load_roles(&mut self, dir: &dyn Directory) -> Result<&BTreeMap<u64, Vec<RoleGrant>>> {
        if self.roles.is_none() {
            let grants = dir.find_role_grants(&self.guid)?;
            let mut grouped: BTreeMap<u64, Vec<RoleGrant>> = BTreeMap::new();
            for grant in grants {
                grouped.entry(grant.org_id).or_default().push(grant);
            }
            self.roles = Some(grouped);
        }
        Ok(self.roles.as_ref().unwrap())
    }
}

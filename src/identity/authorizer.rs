use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, warn};

use super::claims::Claims;
use super::principal::Identity;
use super::roles::RoleGrant;

/// Persistence boundary for identity lookups. The store connection itself is
/// owned elsewhere; these are the only queries the auth core performs.
pub trait Directory: Send + Sync {
    fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>>;
    fn find_role_grants(&self, user_guid: &str) -> Result<Vec<RoleGrant>>;
    /// Callers never invoke this with an empty set; see `visible_identities`.
    fn find_identities_by_org_set(&self, org_ids: &BTreeSet<u64>) -> Result<Vec<Identity>>;
}

/// The identities visible to a caller: everyone holding any role grant in
/// any organization where the claims hold any role. Holding any role at all
/// grants roster visibility into that org under the current policy.
///
/// Each returned identity carries its own role grants, resolved and cached
/// on the instance for downstream serialization.
pub fn visible_identities(claims: &Claims, dir: &dyn Directory) -> Result<Vec<Identity>> {
    let org_ids = claims.org_ids();
    if org_ids.is_empty() {
        // Nothing to query against; an empty IN-set is not a valid query.
        debug!(sub = %claims.sub, "no org claims, returning empty roster");
        return Ok(Vec::new());
    }

    let mut users = dir.find_identities_by_org_set(&org_ids)?;

    // The join can repeat an identity once per matching grant.
    let mut seen: BTreeSet<String> = BTreeSet::new();
    users.retain(|u| seen.insert(u.guid.clone()));

    for user in users.iter_mut() {
        // A single failed grant lookup should not block the whole roster;
        // return what is available.
        if let Err(e) = user.load_roles(dir) {
            warn!(user_guid = %user.guid, error = %e, "failed to load roles for user");
        }
    }

    Ok(users)
}

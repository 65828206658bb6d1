use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::principal::Identity;
use super::roles::RoleKind;

/// The signed token payload: a snapshot of an identity's per-organization
/// role grants taken at issuance, plus the standard temporal fields. Claims
/// are never refreshed mid-lifetime and never persisted; once the request
/// that carried them completes they are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity guid.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expires-at, unix seconds.
    pub exp: i64,
    /// Organization id -> role kinds held there.
    #[serde(rename = "orgs", default)]
    pub roles: BTreeMap<u64, BTreeSet<RoleKind>>,
}

impl Claims {
    /// Snapshot `identity`'s loaded role grants into a claims value valid
    /// for `ttl_secs` from now.
    pub fn for_identity(identity: &Identity, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp();
        let mut roles: BTreeMap<u64, BTreeSet<RoleKind>> = BTreeMap::new();
        if let Some(grouped) = &identity.roles {
            for (org_id, grants) in grouped {
                let kinds: BTreeSet<RoleKind> = grants.iter().map(|g| g.kind).collect();
                roles.insert(*org_id, kinds);
            }
        }
        Self { sub: identity.guid.clone(), iat: now, exp: now + ttl_secs as i64, roles }
    }

    /// The organizations where the subject holds any role at all.
    pub fn org_ids(&self) -> BTreeSet<u64> {
        self.roles.keys().copied().collect()
    }

    pub fn has_role(&self, org_id: u64, kind: RoleKind) -> bool {
        self.roles.get(&org_id).map(|kinds| kinds.contains(&kind)).unwrap_or(false)
    }

    /// SiteAdmin is granted on the reserved organization 0 and is
    /// service-wide.
    pub fn is_site_admin(&self) -> bool {
        self.has_role(0, RoleKind::SiteAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::RoleGrant;

    #[test]
    fn snapshot_groups_roles_by_org() {
        let mut identity = Identity::new("u-1", "a@example.org");
        let mut grouped = std::collections::BTreeMap::new();
        grouped.insert(
            7,
            vec![
                RoleGrant { org_id: 7, user_guid: "u-1".into(), kind: RoleKind::OrgAdmin },
                RoleGrant { org_id: 7, user_guid: "u-1".into(), kind: RoleKind::Mobile },
            ],
        );
        identity.roles = Some(grouped);

        let claims = Claims::for_identity(&identity, 3600);
        assert_eq!(claims.sub, "u-1");
        assert!(claims.exp > claims.iat);
        assert!(claims.has_role(7, RoleKind::OrgAdmin));
        assert!(claims.has_role(7, RoleKind::Mobile));
        assert!(!claims.has_role(8, RoleKind::OrgAdmin));
        assert_eq!(claims.org_ids().into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn claim_wire_shape_uses_orgs_key_and_numeric_roles() {
        let mut identity = Identity::new("u-2", "b@example.org");
        identity.roles = Some(std::collections::BTreeMap::from([(
            3,
            vec![RoleGrant { org_id: 3, user_guid: "u-2".into(), kind: RoleKind::Volunteer }],
        )]));
        let claims = Claims::for_identity(&identity, 60);
        let v = serde_json::to_value(&claims).unwrap();
        assert_eq!(v["orgs"]["3"], serde_json::json!([2]));
    }
}

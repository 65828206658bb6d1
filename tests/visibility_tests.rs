//! Roster-visibility tests with a counted mock at the Directory seam:
//! empty-claims short-circuit, org-scoped filtering, deduplication and the
//! per-identity role-grant cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};

use volunteer_savvy::identity::{
    visible_identities, Claims, Directory, Identity, RoleGrant, RoleKind,
};

#[derive(Default)]
struct MockDirectory {
    identities: Vec<Identity>,
    grants: Vec<RoleGrant>,
    /// Guids whose grant lookup should fail.
    failing_guids: Vec<String>,
    org_set_calls: AtomicUsize,
    grant_calls: AtomicUsize,
}

impl MockDirectory {
    fn with_user(mut self, guid: &str, email: &str) -> Self {
        self.identities.push(Identity::new(guid, email));
        self
    }

    fn with_grant(mut self, org_id: u64, guid: &str, kind: RoleKind) -> Self {
        self.grants.push(RoleGrant { org_id, user_guid: guid.into(), kind });
        self
    }
}

impl Directory for MockDirectory {
    fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.identities.iter().find(|u| u.email == email).cloned())
    }

    fn find_role_grants(&self, user_guid: &str) -> Result<Vec<RoleGrant>> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_guids.iter().any(|g| g == user_guid) {
            return Err(anyhow!("grant lookup failed"));
        }
        Ok(self.grants.iter().filter(|g| g.user_guid == user_guid).cloned().collect())
    }

    fn find_identities_by_org_set(&self, org_ids: &BTreeSet<u64>) -> Result<Vec<Identity>> {
        self.org_set_calls.fetch_add(1, Ordering::SeqCst);
        assert!(!org_ids.is_empty(), "callers must never query an empty org set");
        // One row per matching grant, as the underlying join produces.
        let mut out = Vec::new();
        for grant in self.grants.iter().filter(|g| org_ids.contains(&g.org_id)) {
            if let Some(user) = self.identities.iter().find(|u| u.guid == grant.user_guid) {
                out.push(Identity::new(user.guid.clone(), user.email.clone()));
            }
        }
        Ok(out)
    }
}

fn claims_for(orgs: &[(u64, RoleKind)]) -> Claims {
    let mut roles: BTreeMap<u64, BTreeSet<RoleKind>> = BTreeMap::new();
    for (org, kind) in orgs {
        roles.entry(*org).or_default().insert(*kind);
    }
    Claims { sub: "caller".into(), iat: 0, exp: i64::MAX, roles }
}

fn guids(users: &[Identity]) -> BTreeSet<String> {
    users.iter().map(|u| u.guid.clone()).collect()
}

#[test]
fn empty_org_claims_return_empty_without_querying() {
    let dir = MockDirectory::default().with_user("u-1", "a@example.org");
    let out = visible_identities(&claims_for(&[]), &dir).expect("visible");
    assert!(out.is_empty());
    assert_eq!(dir.org_set_calls.load(Ordering::SeqCst), 0, "store must not be queried");
    assert_eq!(dir.grant_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn roster_is_limited_to_shared_organizations() {
    // Users in org 1 and org 2; claims only in org 1.
    let dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_user("u-bob", "bob@example.org")
        .with_user("u-carol", "carol@example.org")
        .with_grant(1, "u-alice", RoleKind::OrgAdmin)
        .with_grant(1, "u-bob", RoleKind::Volunteer)
        .with_grant(2, "u-carol", RoleKind::Volunteer);

    let out = visible_identities(&claims_for(&[(1, RoleKind::OrgAdmin)]), &dir).expect("visible");
    let expected: BTreeSet<String> = ["u-alice", "u-bob"].iter().map(|s| s.to_string()).collect();
    assert_eq!(guids(&out), expected);
}

#[test]
fn any_role_grants_visibility_not_just_admin_ones() {
    let dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_grant(1, "u-alice", RoleKind::OrgAdmin);

    // A plain volunteer in org 1 sees the org 1 roster under current policy.
    let out =
        visible_identities(&claims_for(&[(1, RoleKind::Volunteer)]), &dir).expect("visible");
    let expected: BTreeSet<String> = ["u-alice"].iter().map(|s| s.to_string()).collect();
    assert_eq!(guids(&out), expected);
}

#[test]
fn multiple_grants_do_not_duplicate_a_user() {
    let dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_grant(1, "u-alice", RoleKind::OrgAdmin)
        .with_grant(1, "u-alice", RoleKind::Mobile)
        .with_grant(2, "u-alice", RoleKind::Volunteer);

    let out = visible_identities(
        &claims_for(&[(1, RoleKind::OrgAdmin), (2, RoleKind::OrgAdmin)]),
        &dir,
    )
    .expect("visible");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].guid, "u-alice");
}

#[test]
fn returned_identities_carry_their_own_grants() {
    let dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_grant(1, "u-alice", RoleKind::OrgAdmin)
        .with_grant(2, "u-alice", RoleKind::Volunteer);

    let out = visible_identities(&claims_for(&[(1, RoleKind::Volunteer)]), &dir).expect("visible");
    let roles = out[0].roles.as_ref().expect("roles loaded");
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[&1][0].kind, RoleKind::OrgAdmin);
    assert_eq!(roles[&2][0].kind, RoleKind::Volunteer);
}

#[test]
fn one_failed_grant_lookup_does_not_block_the_roster() {
    let mut dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_user("u-bob", "bob@example.org")
        .with_grant(1, "u-alice", RoleKind::Volunteer)
        .with_grant(1, "u-bob", RoleKind::Volunteer);
    dir.failing_guids.push("u-alice".into());

    let out = visible_identities(&claims_for(&[(1, RoleKind::Volunteer)]), &dir).expect("visible");
    assert_eq!(out.len(), 2, "both users returned despite one failed lookup");
    let bob = out.iter().find(|u| u.guid == "u-bob").expect("bob present");
    assert!(bob.roles.is_some());
}

#[test]
fn role_grants_are_cached_per_identity() {
    let dir = MockDirectory::default()
        .with_user("u-alice", "alice@example.org")
        .with_grant(1, "u-alice", RoleKind::OrgAdmin);

    let mut identity = dir.find_identity_by_email("alice@example.org").unwrap().unwrap();
    identity.load_roles(&dir).expect("first load");
    identity.load_roles(&dir).expect("second load");
    assert_eq!(dir.grant_calls.load(Ordering::SeqCst), 1, "second call must hit the cache");
}

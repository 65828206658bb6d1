use serde::{Deserialize, Serialize};

/// Role kinds are a closed set and travel on the wire as their numeric code,
/// so the claim shape stays stable across deployed issuer/verifier versions.
/// An unknown code fails the decode rather than degrading to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RoleKind {
    /// Administrative permissions for the service as a whole.
    SiteAdmin = 0,
    /// Administrative permissions for a single organization.
    OrgAdmin = 1,
    /// Able to sign up and log work.
    Volunteer = 2,
    /// Able to sign up as a site coordinator and manage those sites' settings.
    SiteManager = 3,
    /// Able to log work, handle suggestions and reports; no user/site admin.
    BackOffice = 4,
    /// Opted in to mobile-site notifications.
    Mobile = 5,
}

impl From<RoleKind> for u8 {
    fn from(kind: RoleKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for RoleKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RoleKind::SiteAdmin),
            1 => Ok(RoleKind::OrgAdmin),
            2 => Ok(RoleKind::Volunteer),
            3 => Ok(RoleKind::SiteManager),
            4 => Ok(RoleKind::BackOffice),
            5 => Ok(RoleKind::Mobile),
            other => Err(format!("unknown role kind code {other}")),
        }
    }
}

/// A single permission record: one role kind granted to one identity within
/// one organization. An identity may hold several grants per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub org_id: u64,
    pub user_guid: String,
    #[serde(rename = "name")]
    pub kind: RoleKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_kind_round_trips_as_code() {
        let json = serde_json::to_string(&RoleKind::SiteManager).unwrap();
        assert_eq!(json, "3");
        let back: RoleKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoleKind::SiteManager);
    }

    #[test]
    fn unknown_role_code_fails_closed() {
        let res: Result<RoleKind, _> = serde_json::from_str("17");
        assert!(res.is_err());
    }
}

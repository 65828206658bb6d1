use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "lat")]
    pub latitude: String,
    #[serde(rename = "lon")]
    pub longitude: String,
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "zip")]
    pub zip_code: String,
}

/// One open/close rule. Either `day_of_week` is set (a recurring default for
/// that weekday) or `date` is set (a dated calendar override) — never both,
/// never neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    /// Expected format: YYYY-MM-DD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Expected format: HH:MM.
    #[serde(rename = "open")]
    pub open_time: String,
    #[serde(rename = "close")]
    pub close_time: String,
    pub is_open: bool,
}

/// Reference to a coordinator who manages a site. Deduplicated by guid
/// within a site's manager set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRef {
    #[serde(rename = "user_guid")]
    pub guid: String,
    pub email: String,
}

/// The reconstructed nested view of a site: scalar fields, its managers,
/// the per-weekday default schedule and the dated overrides. Built
/// transiently per read request from joined rows, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub slug: String,
    pub name: String,
    pub locale: String,
    pub organization_id: u64,
    #[serde(flatten)]
    pub location: Location,
    #[serde(rename = "active")]
    pub is_active: bool,
    pub managers: Vec<ManagerRef>,
    /// Day-of-week token -> recurring default rule.
    pub default_schedule: BTreeMap<String, DailySchedule>,
    /// Dated exceptions, in input order; chronological sorting, when needed,
    /// is a caller concern.
    pub calendar_overrides: Vec<DailySchedule>,
}

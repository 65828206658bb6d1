use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::site::{DailySchedule, Location, ManagerRef, Site};

/// One flat row from the site x coordinator x daily-schedule outer join. A
/// site appears across many rows; the nullable columns indicate no match on
/// that side of the join and must be skipped, not materialized as an empty
/// child.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRow {
    pub slug: String,
    pub name: String,
    pub locale: String,
    pub organization_id: u64,
    #[serde(flatten)]
    pub location: Location,
    pub is_active: bool,

    pub coordinator_guid: Option<String>,
    pub coordinator_email: Option<String>,

    /// Set on a default-schedule row: the day-of-week token.
    pub schedule_default_day: Option<String>,
    /// Set on an override row: the calendar date, YYYY-MM-DD.
    pub schedule_override_date: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_open: Option<bool>,
}

/// Reassemble a flat, possibly duplicated row stream into nested site
/// aggregates in a single pass.
///
/// Scalar site fields are taken from the first row seen for a slug and never
/// re-overwritten. Managers are deduplicated by guid. Default-schedule rows
/// upsert by weekday; override rows append in input order. A row carrying
/// both schedule markers violates the join's invariant and is skipped with a
/// warning so it cannot hide the site's valid rows. Output order is
/// unspecified.
pub fn collate_sites(rows: Vec<SiteRow>) -> Vec<Site> {
    let mut sites: BTreeMap<String, Site> = BTreeMap::new();

    for row in rows {
        if row.schedule_default_day.is_some() && row.schedule_override_date.is_some() {
            warn!(
                slug = %row.slug,
                day = row.schedule_default_day.as_deref(),
                date = row.schedule_override_date.as_deref(),
                "schedule row carries both a weekday default and a date override, skipping"
            );
            continue;
        }

        let site = sites.entry(row.slug.clone()).or_insert_with(|| Site {
            slug: row.slug.clone(),
            name: row.name.clone(),
            locale: row.locale.clone(),
            organization_id: row.organization_id,
            location: row.location.clone(),
            is_active: row.is_active,
            ..Default::default()
        });

        if let Some(guid) = &row.coordinator_guid {
            if !site.managers.iter().any(|m| &m.guid == guid) {
                site.managers.push(ManagerRef {
                    guid: guid.clone(),
                    email: row.coordinator_email.clone().unwrap_or_default(),
                });
            }
        }

        if let Some(day) = &row.schedule_default_day {
            site.default_schedule.insert(
                day.clone(),
                DailySchedule {
                    day_of_week: Some(day.clone()),
                    date: None,
                    open_time: row.open_time.clone().unwrap_or_default(),
                    close_time: row.close_time.clone().unwrap_or_default(),
                    is_open: row.is_open.unwrap_or_default(),
                },
            );
        } else if let Some(date) = &row.schedule_override_date {
            site.calendar_overrides.push(DailySchedule {
                day_of_week: None,
                date: Some(date.clone()),
                open_time: row.open_time.clone().unwrap_or_default(),
                close_time: row.close_time.clone().unwrap_or_default(),
                is_open: row.is_open.unwrap_or_default(),
            });
        }
    }

    sites.into_values().collect()
}

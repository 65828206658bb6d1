//! Site aggregates and the flat-row collation engine.

mod collate;
mod site;

pub use collate::{collate_sites, SiteRow};
pub use site::{DailySchedule, Location, ManagerRef, Site};

use anyhow::Result;

/// Persistence boundary for the site read paths: the one-to-many outer join
/// of site x coordinator x daily-schedule, flattened into duplicated rows.
pub trait SiteStore: Send + Sync {
    fn select_joined_site_rows(&self, slug: Option<&str>) -> Result<Vec<SiteRow>>;
}

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use volunteer_savvy::config::ServiceConfig;
use volunteer_savvy::identity::RoleKind;
use volunteer_savvy::sites::SiteRow;
use volunteer_savvy::store::MemoryStore;

/// Seed a small demo dataset so a fresh checkout has something to log in
/// with and list. Real deployments replace the store behind the same traits.
fn seed_demo_data(store: &MemoryStore) -> anyhow::Result<()> {
    let guid = uuid::Uuid::new_v4().to_string();
    store.add_identity(&guid, "admin@example.org", "volunteer")?;
    store.grant_role(1, &guid, RoleKind::OrgAdmin);
    store.add_site_rows(vec![
        SiteRow {
            slug: "demo-site".into(),
            name: "Demo Site".into(),
            locale: "en-US".into(),
            organization_id: 1,
            is_active: true,
            coordinator_guid: Some(guid.clone()),
            coordinator_email: Some("admin@example.org".into()),
            schedule_default_day: Some("monday".into()),
            open_time: Some("09:00".into()),
            close_time: Some("17:00".into()),
            is_open: Some(true),
            ..Default::default()
        },
        SiteRow {
            slug: "demo-site".into(),
            name: "Demo Site".into(),
            locale: "en-US".into(),
            organization_id: 1,
            is_active: true,
            schedule_override_date: Some("2026-12-25".into()),
            open_time: Some("00:00".into()),
            close_time: Some("00:00".into()),
            is_open: Some(false),
            ..Default::default()
        },
    ]);
    info!("Seeded demo identity admin@example.org and site 'demo-site'");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = ServiceConfig::from_env()?;

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        "volunteer-savvy starting: RUST_LOG='{}', http_port={}, token_ttl_secs={}",
        rust_log, config.http_port, config.token_ttl_secs
    );

    let store = MemoryStore::new();
    seed_demo_data(&store)?;

    volunteer_savvy::server::run(config, store).await
}

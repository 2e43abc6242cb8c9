use anyhow::Result;
use setup_sync::ModelCatalog;
use setup_sync_store::{LocalStore, SyncStatus};

/// Print the last setup outcome for `account` and per-model freshness.
pub fn run(store: &LocalStore, catalog: &ModelCatalog, account: &str) -> Result<()> {
    match store.last_setup(account)? {
        Some(record) if record.missing.is_empty() => {
            println!("Last setup for {account}: {}", record.outcome);
        }
        Some(record) => {
            println!(
                "Last setup for {account}: {} (missing: {})",
                record.outcome,
                record.missing.join(", ")
            );
        }
        None => println!("No setup recorded for {account}."),
    }

    for (priority, descriptors) in catalog.tiers_in_order() {
        for descriptor in descriptors {
            let name = descriptor.name();
            let status = match store.model_status(name)? {
                SyncStatus::NeverSynced => "never synced".to_owned(),
                SyncStatus::Fresh { days_old } => format!("fresh ({days_old}d)"),
                SyncStatus::Stale { days_old } => format!("stale ({days_old}d)"),
            };
            let count = store.record_count(name)?;
            println!("  [{priority}] {name}: {count} record(s), {status}");
        }
    }

    Ok(())
}

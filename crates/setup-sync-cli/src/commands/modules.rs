use anyhow::Result;
use setup_sync_store::LocalStore;

/// Print the locally synchronized module registry.
pub fn run(store: &LocalStore) -> Result<()> {
    let entries = store.module_entries()?;
    if entries.is_empty() {
        println!(
            "No modules in {}. Run `setup-sync run` first.",
            store.registry_model()
        );
        return Ok(());
    }

    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &entries {
        let marker = if entry.is_installed() { " " } else { "!" };
        println!("{marker} {:<width$}  {}", entry.name, entry.state);
    }

    let missing = entries.iter().filter(|e| !e.is_installed()).count();
    if missing > 0 {
        println!("{missing} module(s) not installed.");
    }
    Ok(())
}

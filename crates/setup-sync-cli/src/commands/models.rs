use setup_sync::ModelCatalog;

/// Print the catalog, one tier at a time in execution order.
pub fn run(catalog: &ModelCatalog) {
    for (priority, descriptors) in catalog.tiers_in_order() {
        println!("{priority} ({})", priority.description());
        if descriptors.is_empty() {
            println!("  (none)");
        }
        for descriptor in descriptors {
            println!("  {}", descriptor.name());
        }
    }
}

use std::collections::HashMap;

use crate::descriptor::{ModelDescriptor, ModelRegistry};
use crate::priority::Priority;

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("model {name} registered in both {first} and {second}")]
    DuplicateModel {
        name: String,
        first: Priority,
        second: Priority,
    },
}

/// Immutable mapping from tier to the models synchronized in that tier.
///
/// Every model belongs to exactly one tier; insertion order within a tier is
/// preserved.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    tiers: [Vec<ModelDescriptor>; 4],
}

impl ModelCatalog {
    pub fn builder() -> ModelCatalogBuilder {
        ModelCatalogBuilder::default()
    }

    /// Build a catalog from `(tier, model name)` pairs, resolving factories
    /// through `registry`.
    pub fn from_names<'a, I>(entries: I, registry: &ModelRegistry) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (Priority, &'a str)>,
    {
        let mut builder = Self::builder();
        for (priority, name) in entries {
            builder = builder.register(priority, registry.resolve(name));
        }
        builder.build()
    }

    /// All four tiers in execution order, including empty ones.
    pub fn tiers_in_order(&self) -> impl Iterator<Item = (Priority, &[ModelDescriptor])> {
        Priority::ALL
            .into_iter()
            .map(move |p| (p, self.tiers[p.index()].as_slice()))
    }

    pub fn descriptors_for(&self, priority: Priority) -> &[ModelDescriptor] {
        &self.tiers[priority.index()]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tiers.iter().flatten().any(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct ModelCatalogBuilder {
    entries: Vec<(Priority, ModelDescriptor)>,
}

impl ModelCatalogBuilder {
    pub fn register(mut self, priority: Priority, descriptor: ModelDescriptor) -> Self {
        self.entries.push((priority, descriptor));
        self
    }

    /// Register standard descriptors for every name in `names`.
    pub fn models<'a>(
        mut self,
        priority: Priority,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        for name in names {
            self.entries.push((priority, ModelDescriptor::new(name)));
        }
        self
    }

    pub fn build(self) -> Result<ModelCatalog, CatalogError> {
        let mut seen: HashMap<String, Priority> = HashMap::new();
        let mut catalog = ModelCatalog::default();

        for (priority, descriptor) in self.entries {
            if let Some(first) = seen.insert(descriptor.name().to_owned(), priority) {
                return Err(CatalogError::DuplicateModel {
                    name: descriptor.name().to_owned(),
                    first,
                    second: priority,
                });
            }
            catalog.tiers[priority.index()].push(descriptor);
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptors: &[ModelDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.name()).collect()
    }

    #[test]
    fn empty_catalog_still_has_four_tiers() {
        let catalog = ModelCatalog::builder().build().unwrap();
        let tiers: Vec<_> = catalog.tiers_in_order().collect();

        assert_eq!(tiers.len(), 4);
        assert_eq!(
            tiers.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            Priority::ALL.to_vec()
        );
        assert!(tiers.iter().all(|(_, d)| d.is_empty()));
        assert!(catalog.is_empty());
    }

    #[test]
    fn preserves_insertion_order_within_tier() {
        let catalog = ModelCatalog::builder()
            .models(Priority::High, ["b.model", "a.model"])
            .register(Priority::High, ModelDescriptor::new("c.model"))
            .build()
            .unwrap();

        assert_eq!(
            names(catalog.descriptors_for(Priority::High)),
            vec!["b.model", "a.model", "c.model"]
        );
    }

    #[test]
    fn registration_order_across_tiers_does_not_matter() {
        let catalog = ModelCatalog::builder()
            .models(Priority::Default, ["res.partner"])
            .models(Priority::High, ["ir.module.module"])
            .build()
            .unwrap();

        let order: Vec<_> = catalog
            .tiers_in_order()
            .flat_map(|(_, d)| names(d))
            .collect();
        assert_eq!(order, vec!["ir.module.module", "res.partner"]);
    }

    #[test]
    fn unregistered_tier_is_empty_not_an_error() {
        let catalog = ModelCatalog::builder()
            .models(Priority::High, ["a"])
            .build()
            .unwrap();
        assert!(catalog.descriptors_for(Priority::Low).is_empty());
    }

    #[test]
    fn duplicate_across_tiers_is_rejected() {
        let err = ModelCatalog::builder()
            .models(Priority::High, ["res.users"])
            .models(Priority::Medium, ["res.users"])
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            CatalogError::DuplicateModel {
                name: "res.users".into(),
                first: Priority::High,
                second: Priority::Medium,
            }
        );
    }

    #[test]
    fn duplicate_within_tier_is_rejected() {
        let result = ModelCatalog::builder()
            .models(Priority::Low, ["x", "x"])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn from_names_resolves_through_registry() {
        let mut registry = ModelRegistry::new();
        registry.register_standard("res.partner");

        let catalog = ModelCatalog::from_names(
            [(Priority::High, "res.partner"), (Priority::Low, "missing")],
            &registry,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("missing"));
        assert!(!catalog.contains("res.users"));
    }
}

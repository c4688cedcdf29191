//! Source catalog
//!
//! The catalog is the static registry of animal sources. It is built once
//! at startup, then shared (behind an `Arc`) by the resolver and the share
//! state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use urag_core::SourceCatalog;
//!
//! let mut catalog = SourceCatalog::new();
//! catalog.register(Arc::new(DogCeo::new(upstream.clone())))?;
//! urag_sources::register(&mut catalog, &context)?;
//!
//! let dog_sources = catalog.sources_for_species(&Species::new("Dog"));
//! ```
//!
//! ## Selection
//!
//! [`SourceCatalog::candidates`] applies the filter rules:
//! - fixed species: only sources declaring it
//! - fixed source: only that source, with its declared species
//! - both: their intersection, empty if the source lacks the species

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::traits::{AnimalSource, Species};

/// One source eligible for a slot, with the species it may be asked for
#[derive(Clone)]
pub struct Candidate {
    /// The source
    pub source: Arc<dyn AnimalSource>,
    /// Species to draw from; empty for species-agnostic sources
    pub species: Vec<Species>,
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("source", &self.source.id())
            .field("species", &self.species)
            .finish()
    }
}

/// Registry of animal sources, in registration order
#[derive(Default, Clone)]
pub struct SourceCatalog {
    sources: Vec<Arc<dyn AnimalSource>>,
}

impl SourceCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: a source with the same id is already registered
    pub fn register(&mut self, source: Arc<dyn AnimalSource>) -> Result<()> {
        if self.has_source(source.id()) {
            return Err(Error::config(format!(
                "Source '{}' is already registered",
                source.id()
            )));
        }
        tracing::debug!("Registered source {}", source.id());
        self.sources.push(source);
        Ok(())
    }

    /// Look up a source by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn AnimalSource>> {
        self.sources.iter().find(|s| s.id() == id).cloned()
    }

    /// Check if a source id is registered
    pub fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id() == id)
    }

    /// All sources in registration order
    pub fn sources(&self) -> &[Arc<dyn AnimalSource>] {
        &self.sources
    }

    /// List all registered source ids
    pub fn list_sources(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Union of every declared species, sorted
    pub fn all_species(&self) -> Vec<Species> {
        self.sources
            .iter()
            .flat_map(|s| s.supported_species().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sources declaring `species`
    pub fn sources_for_species(&self, species: &Species) -> Vec<Arc<dyn AnimalSource>> {
        self.sources
            .iter()
            .filter(|s| s.supported_species().contains(species))
            .cloned()
            .collect()
    }

    /// Declared species of a source, `None` if the id is unknown
    pub fn species_for_source(&self, id: &str) -> Option<Vec<Species>> {
        self.get(id).map(|s| s.supported_species().to_vec())
    }

    /// Candidate sources for a filter selection
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Candidate>)`: possibly empty when the filters exclude each other
    /// - `Err(Error::InvalidArgument)`: the fixed source id is not registered
    pub fn candidates(
        &self,
        source: Option<&str>,
        species: Option<&Species>,
    ) -> Result<Vec<Candidate>> {
        let pool: Vec<Arc<dyn AnimalSource>> = match source {
            Some(id) => vec![
                self.get(id)
                    .ok_or_else(|| Error::invalid_argument(format!("Unknown source: {}", id)))?,
            ],
            None => self.sources.clone(),
        };

        let candidates = pool
            .into_iter()
            .filter_map(|source| {
                let declared = source.supported_species();
                let species = match species {
                    Some(fixed) if declared.contains(fixed) => vec![fixed.clone()],
                    Some(_) => return None,
                    None => declared.to_vec(),
                };
                Some(Candidate { source, species })
            })
            .collect();

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ImageInfo;
    use async_trait::async_trait;

    struct Named {
        id: &'static str,
        species: Vec<Species>,
    }

    #[async_trait]
    impl AnimalSource for Named {
        fn id(&self) -> &str {
            self.id
        }

        fn display_name(&self) -> &str {
            self.id
        }

        fn supported_species(&self) -> &[Species] {
            &self.species
        }

        async fn fetch_random_image_info(&self, _species: Option<&Species>) -> Result<ImageInfo> {
            Ok(ImageInfo::without_id("https://example.test/x.jpg"))
        }

        async fn resolve_image_url_by_id(
            &self,
            _id: &str,
            _species: Option<&Species>,
        ) -> Result<String> {
            Err(crate::traits::id_resolution_unsupported(self.id))
        }
    }

    fn named(id: &'static str, species: &[&str]) -> Arc<dyn AnimalSource> {
        Arc::new(Named {
            id,
            species: species.iter().map(|s| Species::new(*s)).collect(),
        })
    }

    #[test]
    fn test_catalog_registration() {
        let mut catalog = SourceCatalog::new();
        assert!(!catalog.has_source("dog-ceo"));

        catalog.register(named("dog-ceo", &["Dog"])).unwrap();
        assert!(catalog.has_source("dog-ceo"));
        assert!(catalog.list_sources().contains(&"dog-ceo".to_string()));

        let duplicate = catalog.register(named("dog-ceo", &["Dog"]));
        assert!(matches!(duplicate, Err(Error::Config(_))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_all_species_is_sorted_union() {
        let mut catalog = SourceCatalog::new();
        catalog.register(named("a", &["Dog", "Cat"])).unwrap();
        catalog.register(named("b", &["Cat", "Bird"])).unwrap();
        catalog.register(named("c", &[])).unwrap();

        let species: Vec<String> = catalog
            .all_species()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(species, vec!["Bird", "Cat", "Dog"]);
    }

    #[test]
    fn test_capability_lookups() {
        let mut catalog = SourceCatalog::new();
        catalog.register(named("a", &["Dog", "Cat"])).unwrap();
        catalog.register(named("b", &["Cat"])).unwrap();

        let cat_sources = catalog.sources_for_species(&Species::new("Cat"));
        let ids: Vec<&str> = cat_sources.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(
            catalog.species_for_source("b"),
            Some(vec![Species::new("Cat")])
        );
        assert_eq!(catalog.species_for_source("nope"), None);
    }

    #[test]
    fn test_unknown_fixed_source_is_rejected() {
        let catalog = SourceCatalog::new();
        assert!(matches!(
            catalog.candidates(Some("nope"), None),
            Err(Error::InvalidArgument(_))
        ));
    }
}

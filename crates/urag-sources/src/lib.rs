// # urag Sources
//
// This crate provides the animal image source adapters for urag.
//
// ## Architecture
//
// Every adapter implements `urag_core::AnimalSource` and differs only in:
// - the upstream URL it calls and whether it goes through the CORS relay
// - the JSON field holding the image URL
// - how an id is derived from the URL (or that it cannot be)
//
// Adapters never talk to the network directly. They describe requests as
// `Endpoint`s and hand them to an `Upstream`; `HttpUpstream` is the real
// transport.
//
// ## Adapters
//
// | id               | species                        | ids                |
// |------------------|--------------------------------|--------------------|
// | `dog-ceo`        | Dog                            | URL suffix         |
// | `random-duck`    | Duck                           | URL suffix         |
// | `axoltlapi`      | Axolotl                        | none               |
// | `zoo-animal-api` | any                            | upstream record id |
// | `shibe-online`   | Dog, Cat, Bird                 | URL suffix         |
// | `some-random-api`| Dog, Cat, Panda, Fox, ...      | none               |
// | `fishwatch`      | Fish                           | index pair (bulk)  |

pub mod axolotl;
pub mod dog_ceo;
pub mod fishwatch;
pub mod http;
pub mod random_duck;
pub mod shibe;
pub mod some_random_api;
pub mod zoo_animal;

#[cfg(test)]
mod testing;

pub use axolotl::AxolotlApi;
pub use dog_ceo::DogCeo;
pub use fishwatch::FishWatch;
pub use http::HttpUpstream;
pub use random_duck::RandomDuck;
pub use shibe::ShibeOnline;
pub use some_random_api::SomeRandomApi;
pub use zoo_animal::ZooAnimalApi;

use serde_json::Value;
use std::sync::Arc;
use urag_core::traits::{KeyValueStore, Upstream};
use urag_core::{Error, Result, SourceCatalog};

/// Shared dependencies handed to every adapter at construction
#[derive(Clone)]
pub struct SourceContext {
    /// Transport for upstream JSON APIs
    pub upstream: Arc<dyn Upstream>,
    /// Durable store behind bulk-dataset caches
    pub store: Arc<dyn KeyValueStore>,
}

impl SourceContext {
    /// Bundle the transport and store shared by every adapter
    pub fn new(upstream: Arc<dyn Upstream>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { upstream, store }
    }
}

/// Register every adapter in `catalog`
///
/// # Example
///
/// ```rust,ignore
/// use urag_core::SourceCatalog;
///
/// let mut catalog = SourceCatalog::new();
/// urag_sources::register(&mut catalog, &context)?;
/// ```
pub fn register(catalog: &mut SourceCatalog, context: &SourceContext) -> Result<()> {
    let upstream = &context.upstream;

    catalog.register(Arc::new(RandomDuck::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(AxolotlApi::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(ZooAnimalApi::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(DogCeo::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(ShibeOnline::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(SomeRandomApi::new(Arc::clone(upstream))))?;
    catalog.register(Arc::new(FishWatch::new(
        Arc::clone(upstream),
        Arc::clone(&context.store),
    )))?;

    tracing::debug!("Registered {} sources", catalog.len());
    Ok(())
}

/// A catalog holding every adapter
pub fn default_catalog(context: &SourceContext) -> Result<SourceCatalog> {
    let mut catalog = SourceCatalog::new();
    register(&mut catalog, context)?;
    Ok(catalog)
}

/// Read a string field from an upstream body
pub(crate) fn string_field(body: &Value, field: &str, source_id: &str) -> Result<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::upstream(
                source_id,
                format!("response has no string field '{}'", field),
            )
        })
}

/// Reject empty ids before they reach an upstream URL
pub(crate) fn require_id(id: &str, source_id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_argument(format!(
            "{}: image id cannot be empty",
            source_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureUpstream;
    use urag_core::MemoryKvStore;
    use urag_core::traits::Species;

    fn context() -> SourceContext {
        SourceContext::new(
            Arc::new(FixtureUpstream::new()),
            Arc::new(MemoryKvStore::new()),
        )
    }

    #[test]
    fn test_default_catalog_registers_every_adapter() {
        let catalog = default_catalog(&context()).unwrap();

        assert_eq!(
            catalog.list_sources(),
            vec![
                "random-duck",
                "axoltlapi",
                "zoo-animal-api",
                "dog-ceo",
                "shibe-online",
                "some-random-api",
                "fishwatch",
            ]
        );
        let dog_sources: Vec<String> = catalog
            .sources_for_species(&Species::new("Dog"))
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(dog_sources, vec!["dog-ceo", "shibe-online", "some-random-api"]);
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut catalog = default_catalog(&context()).unwrap();
        assert!(register(&mut catalog, &context()).is_err());
    }

    #[test]
    fn test_string_field() {
        let body = serde_json::json!({ "message": "https://x.test/a.jpg", "empty": "" });
        assert_eq!(
            string_field(&body, "message", "dog-ceo").unwrap(),
            "https://x.test/a.jpg"
        );
        assert!(matches!(
            string_field(&body, "empty", "dog-ceo"),
            Err(Error::Upstream { .. })
        ));
        assert!(string_field(&body, "url", "dog-ceo").is_err());
    }
}

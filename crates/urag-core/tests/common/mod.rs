//! Test doubles and common utilities for resolver contract tests
//!
//! These sources never touch the network. Each one counts its calls so a
//! test can assert how often the resolver reached it.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use urag_core::error::{Error, Result};
use urag_core::traits::{AnimalSource, ImageInfo, Species, id_resolution_unsupported, select_species};
use urag_core::{ResolverConfig, SourceCatalog};

/// A source that returns `https://<id>.test/<species>/<n>.jpg` and resolves
/// ids of the form `<species>/<n>.jpg` back to the same URL
pub struct ScriptedSource {
    id: &'static str,
    species: Vec<Species>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl ScriptedSource {
    pub fn new(id: &'static str, species: &[&str]) -> Self {
        Self {
            id,
            species: species.iter().map(|s| Species::new(*s)).collect(),
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    /// Fail the `n`th random fetch (zero-based) with an upstream error
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn base(&self) -> String {
        format!("https://{}.test/", self.id)
    }
}

#[async_trait]
impl AnimalSource for ScriptedSource {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(n) {
            return Err(Error::upstream(self.id, "HTTP 503"));
        }
        let species = select_species(self, species)?;
        let id = format!("{}/{}.jpg", species.map(Species::as_str).unwrap_or("any"), n);
        Ok(ImageInfo::new(id.clone(), format!("{}{}", self.base(), id)))
    }

    async fn resolve_image_url_by_id(&self, id: &str, _species: Option<&Species>) -> Result<String> {
        if id.is_empty() {
            return Err(Error::invalid_argument("empty id"));
        }
        Ok(format!("{}{}", self.base(), id))
    }
}

/// A source whose URLs carry no id
pub struct IdlessSource {
    id: &'static str,
    species: Vec<Species>,
}

impl IdlessSource {
    pub fn new(id: &'static str, species: &str) -> Self {
        Self {
            id,
            species: vec![Species::new(species)],
        }
    }
}

#[async_trait]
impl AnimalSource for IdlessSource {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    fn resolves_ids(&self) -> bool {
        false
    }

    async fn fetch_random_image_info(&self, _species: Option<&Species>) -> Result<ImageInfo> {
        Ok(ImageInfo::without_id(format!("https://{}.test/volatile.png", self.id)))
    }

    async fn resolve_image_url_by_id(&self, _id: &str, _species: Option<&Species>) -> Result<String> {
        Err(id_resolution_unsupported(self.id))
    }
}

/// A source that parks every fetch until released
pub struct GatedSource {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl AnimalSource for GatedSource {
    fn id(&self) -> &str {
        "gated"
    }

    fn display_name(&self) -> &str {
        "Gated"
    }

    fn supported_species(&self) -> &[Species] {
        &[]
    }

    async fn fetch_random_image_info(&self, _species: Option<&Species>) -> Result<ImageInfo> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ImageInfo::new("1", "https://gated.test/1.jpg"))
    }

    async fn resolve_image_url_by_id(&self, id: &str, _species: Option<&Species>) -> Result<String> {
        Ok(format!("https://gated.test/{}.jpg", id))
    }
}

/// A source that panics while fetching
pub struct PanickingSource;

#[async_trait]
impl AnimalSource for PanickingSource {
    fn id(&self) -> &str {
        "panicking"
    }

    fn display_name(&self) -> &str {
        "Panicking"
    }

    fn supported_species(&self) -> &[Species] {
        &[]
    }

    async fn fetch_random_image_info(&self, _species: Option<&Species>) -> Result<ImageInfo> {
        panic!("adapter bug");
    }

    async fn resolve_image_url_by_id(&self, _id: &str, _species: Option<&Species>) -> Result<String> {
        panic!("adapter bug");
    }
}

/// Erase a concrete source for registration, keeping the caller's handle
pub fn shared<S: AnimalSource + 'static>(source: &Arc<S>) -> Arc<dyn AnimalSource> {
    source.clone()
}

/// Build a catalog from the given sources
pub fn catalog_of(sources: Vec<Arc<dyn AnimalSource>>) -> Arc<SourceCatalog> {
    let mut catalog = SourceCatalog::new();
    for source in sources {
        catalog.register(source).unwrap();
    }
    Arc::new(catalog)
}

/// Resolver configuration used by the contract tests
pub fn test_config() -> ResolverConfig {
    ResolverConfig {
        max_count: 12,
        event_channel_capacity: 64,
        ..ResolverConfig::default()
    }
}

// # FishWatch
//
// Adapter for the NOAA FishWatch species dataset. Unlike the other sources
// there is no random endpoint: `GET /api/species` returns the whole dataset,
// which is cached locally and drawn from.
//
// ## Dataset
//
// Each element is a fish species record. Its candidate images are the
// `Image Gallery` entries (an array, a single object or null) followed by
// the `Species Illustration Photo`, each as `{"src": "<url>"}`.
//
// ## Ids
//
// `"<element>-<image>"` indexes into the candidate list of one element.
// Draws never modify the cached dataset, so an id stays valid until the
// next refresh.

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use urag_core::codec::IndexPair;
use urag_core::traits::{
    AnimalSource, Endpoint, ImageInfo, KeyValueStore, Species, Upstream, select_species,
};
use urag_core::{Error, LocalCache, Result};

const ID: &str = "fishwatch";
const DATASET_URL: &str = "https://www.fishwatch.gov/api/species";

/// One species record, reduced to the fields used for images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishRecord {
    #[serde(rename = "Species Name", default)]
    pub name: String,

    #[serde(rename = "Image Gallery", default)]
    pub gallery: Value,

    #[serde(rename = "Species Illustration Photo", default)]
    pub illustration: Value,
}

impl FishRecord {
    /// Candidate image URLs: gallery first, then the illustration
    pub fn candidate_images(&self) -> Vec<&str> {
        let gallery: Vec<&Value> = match &self.gallery {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![&self.gallery],
            _ => Vec::new(),
        };

        gallery
            .into_iter()
            .chain(std::iter::once(&self.illustration))
            .filter_map(|image| image.get("src").and_then(Value::as_str))
            .filter(|src| !src.is_empty())
            .collect()
    }
}

/// Pick an element with at least one image, then one of its images
fn draw<R: Rng>(records: &[FishRecord], rng: &mut R) -> Option<(usize, usize, String)> {
    let populated: Vec<(usize, Vec<&str>)> = records
        .iter()
        .enumerate()
        .map(|(element, record)| (element, record.candidate_images()))
        .filter(|(_, images)| !images.is_empty())
        .collect();

    let (element, images) = populated.choose(&mut *rng)?;
    let image = rng.gen_range(0..images.len());
    Some((*element, image, images[image].to_string()))
}

/// FishWatch source
pub struct FishWatch {
    upstream: Arc<dyn Upstream>,
    cache: LocalCache<Vec<FishRecord>>,
    species: Vec<Species>,
}

impl FishWatch {
    pub fn new(upstream: Arc<dyn Upstream>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            upstream,
            cache: LocalCache::new(ID, store),
            species: vec![Species::new("Fish")],
        }
    }

    async fn fetch_dataset(&self) -> Result<Vec<FishRecord>> {
        let body = self
            .upstream
            .get_json(&Endpoint::proxied(ID, DATASET_URL))
            .await?;
        let records: Vec<FishRecord> = serde_json::from_value(body)
            .map_err(|e| Error::upstream(ID, format!("unexpected dataset shape: {}", e)))?;
        tracing::info!("{}: fetched dataset with {} records", ID, records.len());
        Ok(records)
    }

    /// Refresh if stale; a failed refresh falls back to a stale dataset
    async fn ensure_dataset(&self) -> Result<()> {
        let Err(e) = self.pre_populate_if_stale().await else {
            return Ok(());
        };
        if self.cache.with_payload(|_| ()).await.is_none() {
            return Err(e);
        }
        tracing::warn!("{}: refresh failed, serving stale dataset: {}", ID, e);
        Ok(())
    }
}

#[async_trait]
impl AnimalSource for FishWatch {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "FishWatch"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        select_species(self, species)?;
        self.ensure_dataset().await?;

        let drawn = self
            .cache
            .with_payload(|records| draw(records, &mut rand::thread_rng()))
            .await
            .flatten();

        match drawn {
            Some((element, image, url)) => {
                tracing::debug!("{}: drew image {} of element {}", ID, image, element);
                Ok(ImageInfo::new(IndexPair::encode(element, image), url))
            }
            None => Err(Error::upstream(ID, "dataset has no images")),
        }
    }

    async fn resolve_image_url_by_id(&self, id: &str, species: Option<&Species>) -> Result<String> {
        select_species(self, species)?;
        let (element, image) = IndexPair::decode(id)?;
        self.ensure_dataset().await?;

        self.cache
            .with_payload(|records| {
                records
                    .get(element)
                    .and_then(|record| record.candidate_images().get(image).map(|s| s.to_string()))
            })
            .await
            .flatten()
            .ok_or_else(|| Error::invalid_argument(format!("{}: no image for id {}", ID, id)))
    }

    async fn pre_populate_if_stale(&self) -> Result<()> {
        self.cache
            .refresh_if_stale(|| self.fetch_dataset())
            .await
            .map(|_| ())
    }
}

// # Random Duck
//
// Adapter for https://random-d.uk. The API sends no CORS headers, so every
// request goes through the relay proxy.
//
// `GET /api/v2/random` returns `{"url": "<image url>"}`; the file name after
// `/api/v2/i/` is the id.

use async_trait::async_trait;
use std::sync::Arc;
use urag_core::Result;
use urag_core::codec::UrlSuffix;
use urag_core::traits::{AnimalSource, Endpoint, ImageInfo, Species, Upstream, select_species};

use crate::{require_id, string_field};

const ID: &str = "random-duck";
const RANDOM_URL: &str = "https://random-d.uk/api/v2/random";
const IMAGE_IDS: UrlSuffix = UrlSuffix::new("https://random-d.uk/api/v2/i/");

/// Random Duck source
pub struct RandomDuck {
    upstream: Arc<dyn Upstream>,
    species: Vec<Species>,
}

impl RandomDuck {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            species: vec![Species::new("Duck")],
        }
    }
}

#[async_trait]
impl AnimalSource for RandomDuck {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Random Duck"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        select_species(self, species)?;

        let body = self
            .upstream
            .get_json(&Endpoint::proxied(ID, RANDOM_URL))
            .await?;
        let image_url = string_field(&body, "url", ID)?;

        Ok(match IMAGE_IDS.encode(&image_url) {
            Some(id) => ImageInfo::new(id, image_url),
            None => ImageInfo::without_id(image_url),
        })
    }

    async fn resolve_image_url_by_id(&self, id: &str, species: Option<&Species>) -> Result<String> {
        select_species(self, species)?;
        require_id(id, ID)?;
        Ok(IMAGE_IDS.decode(id))
    }
}

// # Dog CEO
//
// Adapter for https://dog.ceo/dog-api/.
//
// `GET /api/breeds/image/random` returns `{"message": "<image url>"}`. Image
// URLs live under `https://images.dog.ceo/breeds/`; the remainder
// (`<breed>/<file>`) is the id.

use async_trait::async_trait;
use std::sync::Arc;
use urag_core::Result;
use urag_core::codec::UrlSuffix;
use urag_core::traits::{AnimalSource, Endpoint, ImageInfo, Species, Upstream, select_species};

use crate::{require_id, string_field};

const ID: &str = "dog-ceo";
const RANDOM_URL: &str = "https://dog.ceo/api/breeds/image/random";
const IMAGE_IDS: UrlSuffix = UrlSuffix::new("https://images.dog.ceo/breeds/");

/// Dog CEO source
pub struct DogCeo {
    upstream: Arc<dyn Upstream>,
    species: Vec<Species>,
}

impl DogCeo {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            species: vec![Species::new("Dog")],
        }
    }
}

#[async_trait]
impl AnimalSource for DogCeo {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Dog CEO"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        select_species(self, species)?;

        let body = self
            .upstream
            .get_json(&Endpoint::direct(ID, RANDOM_URL))
            .await?;
        let image_url = string_field(&body, "message", ID)?;

        Ok(match IMAGE_IDS.encode(&image_url) {
            Some(id) => ImageInfo::new(id, image_url),
            None => {
                tracing::debug!("{}: {} is outside the image host, no id", ID, image_url);
                ImageInfo::without_id(image_url)
            }
        })
    }

    async fn resolve_image_url_by_id(&self, id: &str, species: Option<&Species>) -> Result<String> {
        select_species(self, species)?;
        require_id(id, ID)?;
        Ok(IMAGE_IDS.decode(id))
    }
}

// # Axolotl API
//
// Adapter for https://axoltlapi.herokuapp.com, reached through the relay
// proxy. The API returns `{"url": "<image url>", "facts": "..."}` and its
// URLs are volatile, so this source is ID-less.

use async_trait::async_trait;
use std::sync::Arc;
use urag_core::Result;
use urag_core::traits::{
    AnimalSource, Endpoint, ImageInfo, Species, Upstream, id_resolution_unsupported,
    select_species,
};

use crate::string_field;

const ID: &str = "axoltlapi";
const RANDOM_URL: &str = "https://axoltlapi.herokuapp.com/";

/// Axolotl API source
pub struct AxolotlApi {
    upstream: Arc<dyn Upstream>,
    species: Vec<Species>,
}

impl AxolotlApi {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            species: vec![Species::new("Axolotl")],
        }
    }
}

#[async_trait]
impl AnimalSource for AxolotlApi {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Axolotl API"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    fn resolves_ids(&self) -> bool {
        false
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        select_species(self, species)?;

        let body = self
            .upstream
            .get_json(&Endpoint::proxied(ID, RANDOM_URL))
            .await?;
        Ok(ImageInfo::without_id(string_field(&body, "url", ID)?))
    }

    async fn resolve_image_url_by_id(&self, _id: &str, _species: Option<&Species>) -> Result<String> {
        Err(id_resolution_unsupported(ID))
    }
}

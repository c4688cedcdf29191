// # Some Random API
//
// Adapter for https://some-random-api.com. `GET /animal/{slug}` returns
// `{"image": "<image url>", "fact": "..."}`. Image URLs are not stable, so
// this source is ID-less.

use async_trait::async_trait;
use std::sync::Arc;
use urag_core::traits::{
    AnimalSource, Endpoint, ImageInfo, Species, Upstream, id_resolution_unsupported,
    select_species,
};
use urag_core::{Error, Result};

use crate::string_field;

const ID: &str = "some-random-api";
const API_BASE: &str = "https://some-random-api.com/animal";

const SPECIES: [&str; 9] = [
    "Dog",
    "Cat",
    "Panda",
    "Fox",
    "Red Panda",
    "Koala",
    "Bird",
    "Raccoon",
    "Kangaroo",
];

/// Path segment the API uses for a species: lowercase, spaces as `_`
fn slug(species: &Species) -> String {
    species.as_str().to_lowercase().replace(' ', "_")
}

/// Some Random API source
pub struct SomeRandomApi {
    upstream: Arc<dyn Upstream>,
    species: Vec<Species>,
}

impl SomeRandomApi {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            species: SPECIES.iter().map(|s| Species::new(*s)).collect(),
        }
    }
}

#[async_trait]
impl AnimalSource for SomeRandomApi {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Some Random API"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    fn resolves_ids(&self) -> bool {
        false
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        let species = select_species(self, species)?
            .ok_or_else(|| Error::invalid_argument(format!("{}: a species is required", ID)))?;

        let url = format!("{}/{}", API_BASE, slug(species));
        let body = self.upstream.get_json(&Endpoint::direct(ID, url)).await?;
        Ok(ImageInfo::without_id(string_field(&body, "image", ID)?))
    }

    async fn resolve_image_url_by_id(&self, _id: &str, _species: Option<&Species>) -> Result<String> {
        Err(id_resolution_unsupported(ID))
    }
}

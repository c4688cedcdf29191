// # Shibe Online
//
// Adapter for https://shibe.online. One endpoint per species:
//
// | species | endpoint      | image host                        |
// |---------|---------------|-----------------------------------|
// | Dog     | `/api/shibes` | `https://cdn.shibe.online/shibes/` |
// | Cat     | `/api/cats`   | `https://cdn.shibe.online/cats/`   |
// | Bird    | `/api/birds`  | `https://cdn.shibe.online/birds/`  |
//
// Each endpoint returns a JSON array of image URLs. The file name below the
// species' image host is the id, so resolution needs the species.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use urag_core::codec::UrlSuffix;
use urag_core::traits::{AnimalSource, Endpoint, ImageInfo, Species, Upstream, select_species};
use urag_core::{Error, Result};

use crate::require_id;

const ID: &str = "shibe-online";

struct Kind {
    species: &'static str,
    endpoint: &'static str,
    images: UrlSuffix,
}

static KINDS: [Kind; 3] = [
    Kind {
        species: "Dog",
        endpoint: "https://shibe.online/api/shibes?count=1&urls=true&httpsUrls=true",
        images: UrlSuffix::new("https://cdn.shibe.online/shibes/"),
    },
    Kind {
        species: "Cat",
        endpoint: "https://shibe.online/api/cats?count=1&urls=true&httpsUrls=true",
        images: UrlSuffix::new("https://cdn.shibe.online/cats/"),
    },
    Kind {
        species: "Bird",
        endpoint: "https://shibe.online/api/birds?count=1&urls=true&httpsUrls=true",
        images: UrlSuffix::new("https://cdn.shibe.online/birds/"),
    },
];

/// Shibe Online source
pub struct ShibeOnline {
    upstream: Arc<dyn Upstream>,
    species: Vec<Species>,
}

impl ShibeOnline {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            species: KINDS.iter().map(|k| Species::new(k.species)).collect(),
        }
    }

    fn kind(&self, species: Option<&Species>) -> Result<&'static Kind> {
        let species = select_species(self, species)?.ok_or_else(|| {
            Error::invalid_argument(format!("{}: a species is required", ID))
        })?;
        KINDS
            .iter()
            .find(|k| k.species == species.as_str())
            .ok_or_else(|| Error::invalid_argument(format!("{}: unknown species {}", ID, species)))
    }
}

#[async_trait]
impl AnimalSource for ShibeOnline {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Shibe Online"
    }

    fn supported_species(&self) -> &[Species] {
        &self.species
    }

    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo> {
        let kind = self.kind(species)?;

        let body = self
            .upstream
            .get_json(&Endpoint::direct(ID, kind.endpoint))
            .await?;
        let image_url = body
            .as_array()
            .and_then(|urls| urls.first())
            .and_then(Value::as_str)
            .ok_or_else(|| Error::upstream(ID, "response is not a list of image URLs"))?
            .to_string();

        Ok(match kind.images.encode(&image_url) {
            Some(id) => ImageInfo::new(id, image_url),
            None => ImageInfo::without_id(image_url),
        })
    }

    async fn resolve_image_url_by_id(&self, id: &str, species: Option<&Species>) -> Result<String> {
        let kind = self.kind(species)?;
        require_id(id, ID)?;
        Ok(kind.images.decode(id))
    }
}

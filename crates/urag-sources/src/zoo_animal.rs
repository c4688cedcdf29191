// # Zoo Animal API
//
// Adapter for https://zoo-animal-api.herokuapp.com. Records cover many
// species and the API cannot filter by one, so this source is
// species-agnostic.
//
// - `GET /animals/rand` returns a record `{"id": 12, "image_link": ...}`
// - `GET /animals/{id}` returns the same record again
//
// The record id is the image id; resolution refetches the record.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use urag_core::traits::{AnimalSource, Endpoint, ImageInfo, Species, Upstream};
use urag_core::{Error, Result};

use crate::{require_id, string_field};

const ID: &str = "zoo-animal-api";
const API_BASE: &str = "https://zoo-animal-api.herokuapp.com/animals";

/// Zoo Animal API source
pub struct ZooAnimalApi {
    upstream: Arc<dyn Upstream>,
}

impl ZooAnimalApi {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Image id of a record; only ids that resolution accepts are kept
    fn record_id(body: &Value) -> Option<String> {
        match body.get("id")? {
            Value::Number(n) => n.as_u64().map(|n| n.to_string()),
            Value::String(s) if is_record_id(s) => Some(s.clone()),
            _ => None,
        }
    }
}

fn is_record_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

#[async_trait]
impl AnimalSource for ZooAnimalApi {
    fn id(&self) -> &str {
        ID
    }

    fn display_name(&self) -> &str {
        "Zoo Animal API"
    }

    fn supported_species(&self) -> &[Species] {
        &[]
    }

    async fn fetch_random_image_info(&self, _species: Option<&Species>) -> Result<ImageInfo> {
        let body = self
            .upstream
            .get_json(&Endpoint::direct(ID, format!("{}/rand", API_BASE)))
            .await?;
        let image_url = string_field(&body, "image_link", ID)?;

        Ok(match Self::record_id(&body) {
            Some(id) => ImageInfo::new(id, image_url),
            None => ImageInfo::without_id(image_url),
        })
    }

    async fn resolve_image_url_by_id(&self, id: &str, _species: Option<&Species>) -> Result<String> {
        require_id(id, ID)?;
        if !is_record_id(id) {
            return Err(Error::invalid_argument(format!(
                "{}: record ids are numeric. Got: {}",
                ID, id
            )));
        }

        let body = self
            .upstream
            .get_json(&Endpoint::direct(ID, format!("{}/{}", API_BASE, id)))
            .await?;
        string_field(&body, "image_link", ID)
    }
}

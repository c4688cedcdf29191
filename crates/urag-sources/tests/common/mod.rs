//! Test doubles for adapter contract tests

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use urag_core::traits::{Endpoint, Upstream};
use urag_core::{Error, Result};

/// Upstream serving canned JSON by target URL; counts requests per URL
#[derive(Default)]
pub struct FixtureUpstream {
    replies: HashMap<String, Value>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FixtureUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Value) -> Self {
        self.replies.insert(url.to_string(), body);
        self
    }

    /// Requests made for `url`
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Upstream for FixtureUpstream {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(endpoint.url.clone())
            .or_default() += 1;

        self.replies.get(&endpoint.url).cloned().ok_or_else(|| {
            Error::upstream(&endpoint.source_id, format!("HTTP 404 for {}", endpoint.url))
        })
    }
}

pub const FISHWATCH_URL: &str = "https://www.fishwatch.gov/api/species";

/// Canned replies for every adapter's random endpoint
pub fn all_fixtures() -> FixtureUpstream {
    FixtureUpstream::new()
        .with(
            "https://dog.ceo/api/breeds/image/random",
            json!({ "message": "https://images.dog.ceo/breeds/hound-afghan/n02088094_1003.jpg", "status": "success" }),
        )
        .with(
            "https://random-d.uk/api/v2/random",
            json!({ "url": "https://random-d.uk/api/v2/i/17.jpg" }),
        )
        .with(
            "https://axoltlapi.herokuapp.com/",
            json!({ "url": "https://i.imgur.com/axolotl.jpg", "facts": "..." }),
        )
        .with(
            "https://zoo-animal-api.herokuapp.com/animals/rand",
            json!({ "id": 33, "image_link": "https://upload.wikimedia.org/okapi.jpg" }),
        )
        .with(
            "https://zoo-animal-api.herokuapp.com/animals/33",
            json!({ "id": 33, "image_link": "https://upload.wikimedia.org/okapi.jpg" }),
        )
        .with(
            "https://shibe.online/api/shibes?count=1&urls=true&httpsUrls=true",
            json!(["https://cdn.shibe.online/shibes/a1.jpg"]),
        )
        .with(
            "https://shibe.online/api/cats?count=1&urls=true&httpsUrls=true",
            json!(["https://cdn.shibe.online/cats/c1.jpg"]),
        )
        .with(
            "https://shibe.online/api/birds?count=1&urls=true&httpsUrls=true",
            json!(["https://cdn.shibe.online/birds/b1.jpg"]),
        )
        .with(
            "https://some-random-api.com/animal/koala",
            json!({ "image": "https://i.some-random-api.com/koala.jpg" }),
        )
        .with(
            FISHWATCH_URL,
            json!([
                {
                    "Species Name": "Atlantic Cod",
                    "Image Gallery": [{ "src": "https://www.fishwatch.gov/cod-1.png" }],
                    "Species Illustration Photo": { "src": "https://www.fishwatch.gov/cod-ill.png" }
                }
            ]),
        )
}

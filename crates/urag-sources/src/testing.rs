//! Fixture upstream for adapter unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use urag_core::traits::{Endpoint, Upstream};
use urag_core::{Error, Result};

use crate::http::status_error;

enum Reply {
    Json(Value),
    Status(u16),
}

/// Serves canned replies by target URL and records every request
#[derive(Default)]
pub(crate) struct FixtureUpstream {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Endpoint>>,
}

impl FixtureUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn json(self, url: &str, body: Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Json(body));
        self
    }

    pub(crate) fn status(self, url: &str, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Status(status));
        self
    }

    pub(crate) fn requests(&self) -> Vec<Endpoint> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for FixtureUpstream {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        self.requests.lock().unwrap().push(endpoint.clone());
        match self.replies.lock().unwrap().get(&endpoint.url) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(status_error(endpoint, *status)),
            None => Err(Error::upstream(
                &endpoint.source_id,
                format!("no fixture for {}", endpoint.url),
            )),
        }
    }
}

//! Opaque id encodings
//!
//! Upstream APIs rarely hand out stable ids, so sources synthesize them.
//! Each scheme is an `encode`/`decode` pair with the round-trip property
//! `decode(encode(x)) == x`.

use crate::error::{Error, Result};

/// Id derived from the part of an image URL after a fixed base
///
/// `https://images.dog.ceo/breeds/hound/n1.jpg` with base
/// `https://images.dog.ceo/breeds/` encodes as `hound/n1.jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlSuffix {
    base: &'static str,
}

impl UrlSuffix {
    /// Scheme for URLs below `base`
    pub const fn new(base: &'static str) -> Self {
        Self { base }
    }

    /// The URL prefix this scheme strips
    pub fn base(&self) -> &'static str {
        self.base
    }

    /// Id for `url`, `None` when the URL is not below the base
    pub fn encode(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.base)
            .filter(|suffix| !suffix.is_empty())
            .map(str::to_string)
    }

    /// URL for `id`
    pub fn decode(&self, id: &str) -> String {
        format!("{}{}", self.base, id)
    }
}

/// Id naming one image inside a bulk dataset: `"<element>-<image>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPair;

impl IndexPair {
    /// Encode an (element, image) index pair
    pub fn encode(element: usize, image: usize) -> String {
        format!("{}-{}", element, image)
    }

    /// Decode an id produced by [`IndexPair::encode`]
    pub fn decode(id: &str) -> Result<(usize, usize)> {
        let malformed = || Error::invalid_argument(format!("Malformed dataset id: '{}'", id));

        let (element, image) = id.split_once('-').ok_or_else(malformed)?;
        let element = element.parse().map_err(|_| malformed())?;
        let image = image.parse().map_err(|_| malformed())?;

        Ok((element, image))
    }
}

// # Animal Source Trait
//
// Defines the capability contract every image provider adapter implements.
//
// ## Implementations
//
// - `urag-sources` crate: one adapter per external API
//
// ## Usage
//
// ```rust,ignore
// use urag_core::AnimalSource;
//
// let info = source.fetch_random_image_info(None).await?;
// if let Some(id) = &info.id {
//     let url = source.resolve_image_url_by_id(id, None).await?;
//     assert_eq!(url, info.image_url);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Category of animal a source or image represents (e.g. "Dog", "Cat")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Species(String);

impl Species {
    /// Create a species tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Species {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Result of a fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Opaque id that resolves back to `image_url`; `None` only for ID-less sources
    pub id: Option<String>,
    /// Displayable image URL
    pub image_url: String,
}

impl ImageInfo {
    /// Image info with a resolvable id
    pub fn new(id: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            image_url: image_url.into(),
        }
    }

    /// Image info from a source that cannot resolve ids
    pub fn without_id(image_url: impl Into<String>) -> Self {
        Self {
            id: None,
            image_url: image_url.into(),
        }
    }
}

/// Trait for animal image source implementations
///
/// Each implementation adapts one external API. Sources are created once at
/// startup, registered in a [`crate::SourceCatalog`] and shared for the
/// process lifetime, so all methods take `&self`.
///
/// # Capabilities
///
/// - Every source can produce a random image.
/// - Sources whose URLs can be rebuilt from an id report
///   [`resolves_ids`](AnimalSource::resolves_ids) `true`. ID-less sources
///   return `false` and fail resolution with
///   [`Error::UnsupportedOperation`].
/// - Bulk-dataset sources override
///   [`pre_populate_if_stale`](AnimalSource::pre_populate_if_stale).
///
/// # Errors
///
/// Sources never retry. A failed upstream call is returned as
/// [`Error::Upstream`] or [`Error::Proxy`] and the resolver reports it for
/// the slot that triggered it.
#[async_trait]
pub trait AnimalSource: Send + Sync {
    /// Stable identifier, used as cache key suffix and share token
    fn id(&self) -> &str;

    /// Human readable name
    fn display_name(&self) -> &str;

    /// Species this source can serve; empty for species-agnostic sources
    fn supported_species(&self) -> &[Species];

    /// Whether ids returned by this source can be resolved back to URLs
    fn resolves_ids(&self) -> bool {
        true
    }

    /// Fetch a random image
    ///
    /// # Parameters
    ///
    /// - `species`: ignored by species-agnostic sources; must be one of
    ///   [`supported_species`](AnimalSource::supported_species) otherwise
    ///
    /// # Returns
    ///
    /// - `Ok(ImageInfo)`: the image and, unless ID-less, its id
    /// - `Err(Error::InvalidArgument)`: unsupported species
    /// - `Err(Error::Upstream | Error::Proxy)`: network or parse failure
    async fn fetch_random_image_info(&self, species: Option<&Species>) -> Result<ImageInfo>;

    /// Rebuild the URL for a previously returned id, without new randomness
    async fn resolve_image_url_by_id(&self, id: &str, species: Option<&Species>)
    -> Result<String>;

    /// Resolve a previously returned id to a full [`ImageInfo`]
    ///
    /// The default pairs `id` with the URL from
    /// [`resolve_image_url_by_id`](AnimalSource::resolve_image_url_by_id).
    async fn resolve_image_info_by_id(
        &self,
        id: &str,
        species: Option<&Species>,
    ) -> Result<ImageInfo> {
        let image_url = self.resolve_image_url_by_id(id, species).await?;
        Ok(ImageInfo::new(id, image_url))
    }

    /// Refresh the bulk dataset if it is stale
    ///
    /// No-op for sources without a bulk dataset.
    async fn pre_populate_if_stale(&self) -> Result<()> {
        Ok(())
    }
}

/// Validate a requested species against a source's declared set
///
/// - species-agnostic source: the request is ignored, returns `Ok(None)`
/// - single-species source: `None` selects the only species
/// - multi-species source: the species is required
///
/// Anything not in the declared set is an [`Error::InvalidArgument`].
pub fn select_species<'a, S: AnimalSource + ?Sized>(
    source: &'a S,
    species: Option<&'a Species>,
) -> Result<Option<&'a Species>> {
    let declared = source.supported_species();
    if declared.is_empty() {
        return Ok(None);
    }

    match species {
        Some(requested) if declared.contains(requested) => Ok(Some(requested)),
        Some(requested) => Err(Error::invalid_argument(format!(
            "{} does not serve species '{}'",
            source.id(),
            requested
        ))),
        None if declared.len() == 1 => Ok(declared.first()),
        None => Err(Error::invalid_argument(format!(
            "{} serves several species; one must be chosen",
            source.id()
        ))),
    }
}

/// The error every ID-less source returns from id resolution
pub fn id_resolution_unsupported(source_id: &str) -> Error {
    Error::unsupported(format!(
        "{} returns volatile URLs and cannot resolve ids",
        source_id
    ))
}

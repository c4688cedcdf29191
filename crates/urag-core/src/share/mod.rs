//! Shareable state
//!
//! After every completed batch the on-screen images are written to a share
//! channel as one encoded string. Loading that string later re-resolves the
//! same images by id instead of drawing new random ones.
//!
//! ## Wire Format
//!
//! `application/x-www-form-urlencoded` pairs:
//!
//! ```text
//! ids=terrier%2Fn02093428_1.jpg&ids=12&sources=dog-ceo&sources=zoo-animal-api
//!   &species=Dog&species=&count=2&select-species=Dog
//! ```
//!
//! - `ids`, `sources`, `species` repeat once per slot, positionally aligned
//! - a species-agnostic slot carries an empty `species`
//! - `count`, `select-source`, `select-species` are optional scalars
//!
//! Decoding is lenient: a leading `#` or `?` is ignored, misaligned arrays
//! drop the slots but keep the scalars, and input with none of the known
//! keys is no restorable state at all.

pub mod file;
pub mod memory;

pub use file::FileShareChannel;
pub use memory::MemoryShareChannel;

use url::form_urlencoded;

use crate::error::Result;
use crate::resolver::{BatchOutcome, FetchRequest};
use crate::traits::{ShareChannel, Species};

const KEY_IDS: &str = "ids";
const KEY_SOURCES: &str = "sources";
const KEY_SPECIES: &str = "species";
const KEY_COUNT: &str = "count";
const KEY_SELECT_SOURCE: &str = "select-source";
const KEY_SELECT_SPECIES: &str = "select-species";

/// One restorable slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSlot {
    /// Source-local image id
    pub id: String,
    /// Source that issued the id
    pub source_id: String,
    /// Species the id was fetched as; `None` for species-agnostic sources
    pub species: Option<Species>,
}

/// Ordered restorable slots; index is the on-screen position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareRecord {
    /// Slots in on-screen order
    pub slots: Vec<ShareSlot>,
}

impl ShareRecord {
    /// Whether there is nothing to re-resolve
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of restorable slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Filter selections active when the batch ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareFilters {
    /// Fixed source id, `None` for any source
    pub source: Option<String>,
    /// Fixed species, `None` for any species
    pub species: Option<Species>,
}

/// Everything written to the share channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareState {
    /// Slots to re-resolve
    pub record: ShareRecord,
    /// Filter selections to restore
    pub filters: ShareFilters,
    /// Slot count to restore
    pub count: Option<usize>,
}

impl ShareState {
    /// Build the state for a settled batch
    ///
    /// Failed slots and slots without an id are left out; the remaining
    /// slots keep their relative order.
    pub fn from_batch(outcome: &BatchOutcome, request: &FetchRequest) -> Self {
        let slots = outcome
            .slots
            .iter()
            .filter_map(|slot| {
                let id = slot.image()?.id.clone()?;
                Some(ShareSlot {
                    id,
                    source_id: slot.source_id.clone(),
                    species: slot.species.clone(),
                })
            })
            .collect();

        Self {
            record: ShareRecord { slots },
            filters: ShareFilters {
                source: request.source.clone(),
                species: request.species.clone(),
            },
            count: Some(request.count),
        }
    }

    /// Encode to the channel string
    pub fn encode(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());

        for slot in &self.record.slots {
            out.append_pair(KEY_IDS, &slot.id);
        }
        for slot in &self.record.slots {
            out.append_pair(KEY_SOURCES, &slot.source_id);
        }
        for slot in &self.record.slots {
            out.append_pair(
                KEY_SPECIES,
                slot.species.as_ref().map(Species::as_str).unwrap_or(""),
            );
        }

        if let Some(count) = self.count {
            out.append_pair(KEY_COUNT, &count.to_string());
        }
        if let Some(source) = &self.filters.source {
            out.append_pair(KEY_SELECT_SOURCE, source);
        }
        if let Some(species) = &self.filters.species {
            out.append_pair(KEY_SELECT_SPECIES, species.as_str());
        }

        out.finish()
    }

    /// Decode a channel string
    ///
    /// # Returns
    ///
    /// - `Some(ShareState)`: at least one known key was present
    /// - `None`: empty or unrecognizable input
    pub fn decode(input: &str) -> Option<Self> {
        let input = input.trim();
        let input = input
            .strip_prefix('#')
            .or_else(|| input.strip_prefix('?'))
            .unwrap_or(input);
        if input.is_empty() {
            return None;
        }

        let mut ids = Vec::new();
        let mut sources = Vec::new();
        let mut species = Vec::new();
        let mut state = ShareState::default();
        let mut recognized = false;

        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            match key.as_ref() {
                KEY_IDS => ids.push(value.into_owned()),
                KEY_SOURCES => sources.push(value.into_owned()),
                KEY_SPECIES => species.push(value.into_owned()),
                KEY_COUNT => {
                    state.count = value.parse::<usize>().ok().filter(|n| *n > 0);
                }
                KEY_SELECT_SOURCE if !value.is_empty() => {
                    state.filters.source = Some(value.into_owned());
                }
                KEY_SELECT_SPECIES if !value.is_empty() => {
                    state.filters.species = Some(Species::new(value.into_owned()));
                }
                KEY_SELECT_SOURCE | KEY_SELECT_SPECIES => {}
                _ => continue,
            }
            recognized = true;
        }

        if !recognized {
            tracing::debug!("Share state has no known keys, nothing to restore");
            return None;
        }

        if ids.len() == sources.len() && ids.len() == species.len() {
            state.record.slots = ids
                .into_iter()
                .zip(sources)
                .zip(species)
                .filter(|((id, source_id), _)| !id.is_empty() && !source_id.is_empty())
                .map(|((id, source_id), species)| ShareSlot {
                    id,
                    source_id,
                    species: (!species.is_empty()).then(|| Species::new(species)),
                })
                .collect();
        } else {
            tracing::warn!(
                "Share state arrays are misaligned (ids={}, sources={}, species={}); dropping slots",
                ids.len(),
                sources.len(),
                species.len()
            );
        }

        Some(state)
    }

    /// The request that produced this state
    ///
    /// Filters and count are restored even when no slot survived;
    /// `default_count` stands in for a missing count.
    pub fn to_request(&self, default_count: usize) -> FetchRequest {
        FetchRequest {
            source: self.filters.source.clone(),
            species: self.filters.species.clone(),
            count: self.count.unwrap_or(default_count),
        }
    }

    /// Write this state to a channel, replacing what was there
    pub async fn save(&self, channel: &dyn ShareChannel) -> Result<()> {
        let encoded = self.encode();
        tracing::debug!("Writing share state: {}", encoded);
        channel.write(&encoded).await
    }

    /// Read the state from a channel
    ///
    /// An unreadable channel is logged and treated as no restorable state.
    pub async fn load(channel: &dyn ShareChannel) -> Option<Self> {
        match channel.read().await {
            Ok(Some(raw)) => Self::decode(&raw),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read share state: {}", e);
                None
            }
        }
    }
}

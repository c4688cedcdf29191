//! Core traits for urag
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AnimalSource`]: Fetch random images and resolve ids back to URLs
//! - [`KeyValueStore`]: Durable store behind the local cache
//! - [`Upstream`]: Transport for upstream JSON APIs
//! - [`ShareChannel`]: Where the shareable state is written

pub mod animal_source;
pub mod kv_store;
pub mod share_channel;
pub mod upstream;

pub use animal_source::{AnimalSource, ImageInfo, Species, id_resolution_unsupported, select_species};
pub use kv_store::KeyValueStore;
pub use share_channel::ShareChannel;
pub use upstream::{DEFAULT_PROXY_BASE, Endpoint, Upstream};

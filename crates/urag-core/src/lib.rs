// # urag-core
//
// Core library for the random animal image generator.
//
// ## Architecture Overview
//
// - **AnimalSource**: Trait for one upstream image API (random draw, id resolution)
// - **LocalCache**: Per-source persisted dataset with 24h staleness
// - **SourceCatalog**: Registry of sources and the species each declares
// - **ImageResolver**: Picks a (source, species) per slot and settles every slot
// - **ShareState**: Encodes the current images so they can be restored by id
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from upstream adapters
// 2. **Plugin-Based**: Adapters register into the catalog; the resolver never names one
// 3. **Per-Slot Failure**: One failing slot never blocks or aborts its siblings
// 4. **Library-First**: All core functionality can be used as a library

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod resolver;
pub mod share;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CacheEntry, LocalCache};
pub use catalog::{Candidate, SourceCatalog};
pub use config::{ResolverConfig, ShareConfig, SourcesConfig, StoreConfig, UragConfig};
pub use error::{Error, Result};
pub use resolver::{BatchOutcome, FetchRequest, ImageResolver, ResolverEvent, SlotOutcome};
pub use share::{
    FileShareChannel, MemoryShareChannel, ShareFilters, ShareRecord, ShareSlot, ShareState,
};
pub use store::{FileKvStore, MemoryKvStore};
pub use traits::{
    AnimalSource, Endpoint, ImageInfo, KeyValueStore, ShareChannel, Species, Upstream,
};

//! Image resolver
//!
//! The ImageResolver is responsible for:
//! - Picking a (source, species) pair for every slot of a batch
//! - Fetching all slots concurrently and settling every one of them
//! - Re-resolving a shared record by id, bypassing randomness
//! - Reporting each slot's outcome as an event
//!
//! ## Architecture
//!
//! ```text
//! FetchRequest ──► plan_batch ──► [SlotPlan; N] ──► join_all ──► BatchOutcome
//!                     │                               │
//!               SourceCatalog                   AnimalSource
//!               (candidates)              (fetch / resolve by id)
//!                                                     │
//!                                              ResolverEvent (notify)
//! ```
//!
//! ## Failure Model
//!
//! A failing slot never aborts its siblings and nothing is retried. The
//! batch is done when every slot has settled. Only request-level problems
//! (a batch already in flight, an unknown source, filters that match
//! nothing) fail the whole call, and they do so before any fetch.

use futures::future::join_all;
use rand::Rng;
use rand::seq::SliceRandom;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::SourceCatalog;
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::share::ShareRecord;
use crate::traits::{AnimalSource, ImageInfo, Species};

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchRequest {
    /// Fixed source id, if any
    pub source: Option<String>,
    /// Fixed species, if any
    pub species: Option<Species>,
    /// Number of slots
    pub count: usize,
}

impl FetchRequest {
    /// Request `count` slots with no filters
    pub fn new(count: usize) -> Self {
        Self {
            source: None,
            species: None,
            count,
        }
    }

    /// Fix the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Fix the species
    pub fn with_species(mut self, species: impl Into<Species>) -> Self {
        self.species = Some(species.into());
        self
    }
}

/// The (source, species) pair drawn for one slot
#[derive(Clone)]
pub struct SlotPlan {
    /// Slot index
    pub slot: usize,
    /// Source to fetch from
    pub source: Arc<dyn AnimalSource>,
    /// Species to ask for; `None` for species-agnostic sources
    pub species: Option<Species>,
}

impl std::fmt::Debug for SlotPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPlan")
            .field("slot", &self.slot)
            .field("source", &self.source.id())
            .field("species", &self.species)
            .finish()
    }
}

/// Settled result of one slot
#[derive(Debug)]
pub struct SlotOutcome {
    /// Slot index
    pub slot: usize,
    /// Source the slot was fetched from
    pub source_id: String,
    /// Species the slot was fetched as
    pub species: Option<Species>,
    /// The image, or the error to show for this slot
    pub result: Result<ImageInfo>,
}

impl SlotOutcome {
    /// The image, if the slot succeeded
    pub fn image(&self) -> Option<&ImageInfo> {
        self.result.as_ref().ok()
    }

    /// The error, if the slot failed
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// Every slot of a settled batch, in slot order
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Slot outcomes
    pub slots: Vec<SlotOutcome>,
}

impl BatchOutcome {
    /// Number of slots that produced an image
    pub fn succeeded(&self) -> usize {
        self.slots.iter().filter(|s| s.result.is_ok()).count()
    }

    /// Number of slots that failed
    pub fn failed(&self) -> usize {
        self.slots.len() - self.succeeded()
    }

    /// Slot outcome by index
    pub fn slot(&self, slot: usize) -> Option<&SlotOutcome> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}

/// Events emitted by the ImageResolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverEvent {
    /// Batch fetch or restore started
    BatchStarted { count: usize },

    /// A slot produced an image
    SlotSucceeded {
        slot: usize,
        source_id: String,
        image_url: String,
    },

    /// A slot failed; one notification per failing slot
    SlotFailed {
        slot: usize,
        source_id: String,
        error: String,
    },

    /// Every slot has settled
    BatchSettled { succeeded: usize, failed: usize },
}

/// Holds the in-flight flag for one batch
///
/// Released on drop, including on early return and unwinding, so a failed
/// or panicking batch cannot leave new requests disabled.
#[derive(Debug)]
pub struct BatchGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        debug!("Batch gate released");
    }
}

/// Orchestrates selection and fetching for a batch of slots
///
/// ## Lifecycle
///
/// 1. Build the [`SourceCatalog`] at startup
/// 2. Create with [`ImageResolver::new()`], keep the event receiver for the UI
/// 3. Call [`fetch_batch`](ImageResolver::fetch_batch) per user request, or
///    [`restore`](ImageResolver::restore) for a shared record
///
/// ## Threading
///
/// Slot futures are joined on the calling task; nothing is spawned. One
/// batch may be in flight at a time.
pub struct ImageResolver {
    /// Registered sources
    catalog: Arc<SourceCatalog>,

    /// Largest accepted slot count
    max_count: usize,

    /// Optional bound on each slot's fetch
    slot_timeout: Option<Duration>,

    /// Event sender for the UI
    event_tx: mpsc::Sender<ResolverEvent>,

    /// Set while a batch is in flight
    in_flight: Arc<AtomicBool>,
}

impl ImageResolver {
    /// Create a new resolver
    ///
    /// # Returns
    ///
    /// A tuple of (resolver, event_receiver) where event_receiver yields resolver events
    pub fn new(
        catalog: Arc<SourceCatalog>,
        config: &ResolverConfig,
    ) -> Result<(Self, mpsc::Receiver<ResolverEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let resolver = Self {
            catalog,
            max_count: config.max_count,
            slot_timeout: config.slot_timeout(),
            event_tx: tx,
            in_flight: Arc::new(AtomicBool::new(false)),
        };

        Ok((resolver, rx))
    }

    /// The catalog this resolver draws from
    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Whether a batch is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Close the gate for a new batch
    ///
    /// # Returns
    ///
    /// - `Ok(BatchGuard)`: the gate, reopened when the guard drops
    /// - `Err(Error::Busy)`: another batch is in flight
    pub fn try_begin_batch(&self) -> Result<BatchGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        Ok(BatchGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// Draw a (source, species) pair for every slot
    ///
    /// Each slot draws independently: a source uniformly from the
    /// candidates, then a species uniformly from that candidate's species.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<SlotPlan>)`: one plan per slot
    /// - `Err(Error::InvalidArgument)`: bad count, unknown source, or no candidates
    pub fn plan_batch<R: Rng + ?Sized>(
        &self,
        request: &FetchRequest,
        rng: &mut R,
    ) -> Result<Vec<SlotPlan>> {
        if request.count == 0 || request.count > self.max_count {
            return Err(Error::invalid_argument(format!(
                "Slot count must be between 1 and {}. Got: {}",
                self.max_count, request.count
            )));
        }

        let candidates = self
            .catalog
            .candidates(request.source.as_deref(), request.species.as_ref())?;

        if candidates.is_empty() {
            return Err(Error::invalid_argument(format!(
                "No source matches source={} species={}",
                request.source.as_deref().unwrap_or("any"),
                request
                    .species
                    .as_ref()
                    .map(Species::as_str)
                    .unwrap_or("any")
            )));
        }

        let plans = (0..request.count)
            .filter_map(|slot| {
                let candidate = candidates.choose(&mut *rng)?;
                let species = candidate.species.choose(&mut *rng).cloned();
                Some(SlotPlan {
                    slot,
                    source: Arc::clone(&candidate.source),
                    species,
                })
            })
            .collect::<Vec<_>>();

        debug!("Planned batch: {:?}", plans);
        Ok(plans)
    }

    /// Fetch a batch of random images
    ///
    /// # Returns
    ///
    /// - `Ok(BatchOutcome)`: every slot settled, successes and failures alike
    /// - `Err(Error)`: request-level failure, nothing was fetched
    pub async fn fetch_batch(&self, request: &FetchRequest) -> Result<BatchOutcome> {
        let _guard = self.try_begin_batch()?;
        let plans = {
            let mut rng = rand::thread_rng();
            self.plan_batch(request, &mut rng)?
        };
        Ok(self.run_plans(plans).await)
    }

    /// Fetch a batch using the given random source
    pub async fn fetch_batch_with_rng<R: Rng + ?Sized>(
        &self,
        request: &FetchRequest,
        rng: &mut R,
    ) -> Result<BatchOutcome> {
        let _guard = self.try_begin_batch()?;
        let plans = self.plan_batch(request, rng)?;
        Ok(self.run_plans(plans).await)
    }

    async fn run_plans(&self, plans: Vec<SlotPlan>) -> BatchOutcome {
        info!("Fetching batch of {} slot(s)", plans.len());
        self.emit_event(ResolverEvent::BatchStarted { count: plans.len() });

        let slots = join_all(plans.into_iter().map(|plan| async move {
            let result = self
                .bounded(
                    plan.source.id(),
                    plan.source.fetch_random_image_info(plan.species.as_ref()),
                )
                .await;
            SlotOutcome {
                slot: plan.slot,
                source_id: plan.source.id().to_string(),
                species: plan.species,
                result,
            }
        }))
        .await;

        self.settle(slots)
    }

    /// Re-resolve a shared record, one slot per triple
    ///
    /// Unknown sources and failed resolutions fail only their own slot.
    ///
    /// # Returns
    ///
    /// - `Err(Error::InvalidArgument)`: the record holds more than `max_count` slots
    pub async fn restore(&self, record: &ShareRecord) -> Result<BatchOutcome> {
        if record.slots.len() > self.max_count {
            return Err(Error::invalid_argument(format!(
                "Shared record holds {} slots, at most {} can be restored",
                record.slots.len(),
                self.max_count
            )));
        }

        let _guard = self.try_begin_batch()?;

        info!("Restoring {} shared slot(s)", record.slots.len());
        self.emit_event(ResolverEvent::BatchStarted {
            count: record.slots.len(),
        });

        let slots = join_all(record.slots.iter().enumerate().map(|(slot, shared)| async move {
            let result = match self.catalog.get(&shared.source_id) {
                Some(source) => {
                    self.bounded(
                        &shared.source_id,
                        source.resolve_image_info_by_id(&shared.id, shared.species.as_ref()),
                    )
                    .await
                }
                None => Err(Error::invalid_argument(format!(
                    "Unknown source: {}",
                    shared.source_id
                ))),
            };
            SlotOutcome {
                slot,
                source_id: shared.source_id.clone(),
                species: shared.species.clone(),
                result,
            }
        }))
        .await;

        Ok(self.settle(slots))
    }

    /// Apply the per-slot timeout, if configured
    async fn bounded<F>(&self, source_id: &str, fetch: F) -> Result<ImageInfo>
    where
        F: Future<Output = Result<ImageInfo>>,
    {
        match self.slot_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                Err(Error::upstream(
                    source_id,
                    format!("timed out after {}s", limit.as_secs()),
                ))
            }),
            None => fetch.await,
        }
    }

    /// Report every settled slot and close out the batch
    fn settle(&self, slots: Vec<SlotOutcome>) -> BatchOutcome {
        for outcome in &slots {
            match &outcome.result {
                Ok(info) => {
                    debug!(
                        "Slot {} from {}: {}",
                        outcome.slot, outcome.source_id, info.image_url
                    );
                    self.emit_event(ResolverEvent::SlotSucceeded {
                        slot: outcome.slot,
                        source_id: outcome.source_id.clone(),
                        image_url: info.image_url.clone(),
                    });
                }
                Err(e) => {
                    warn!("Slot {} from {} failed: {}", outcome.slot, outcome.source_id, e);
                    if e.is_user_visible() {
                        self.emit_event(ResolverEvent::SlotFailed {
                            slot: outcome.slot,
                            source_id: outcome.source_id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let outcome = BatchOutcome { slots };
        info!(
            "Batch settled: {} succeeded, {} failed",
            outcome.succeeded(),
            outcome.failed()
        );
        self.emit_event(ResolverEvent::BatchSettled {
            succeeded: outcome.succeeded(),
            failed: outcome.failed(),
        });
        outcome
    }

    /// Emit a resolver event
    fn emit_event(&self, event: ResolverEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("No event receiver, dropping event")
            }
        }
    }
}

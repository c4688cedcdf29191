// # urag - Random Animal Image Generator
//
// Command-line harness over urag-core and urag-sources.
//
// This binary is responsible for:
// 1. Reading configuration from arguments and environment variables
// 2. Initializing logging and the runtime
// 3. Building the stores, the upstream transport and the source catalog
// 4. Running one command and printing its result
//
// ## Commands
//
// - `urag fetch [--source S] [--species X] [--count N]`: fetch a batch and
//   write the shareable state
// - `urag restore`: re-resolve the images recorded in the share file
// - `urag sources`: list sources and their species
//
// ## Example
//
// ```bash
// export URAG_STATE_PATH=$HOME/.cache/urag/cache.json
// export URAG_SHARE_PATH=$HOME/.cache/urag/share
//
// urag fetch --species Dog --count 3
// urag restore
// ```

mod cli;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use urag_core::traits::{KeyValueStore, ShareChannel};
use urag_core::{
    BatchOutcome, FetchRequest, FileKvStore, FileShareChannel, ImageResolver, MemoryKvStore,
    MemoryShareChannel, ResolverEvent, ShareConfig, ShareState, Species, StoreConfig, UragConfig,
};
use urag_sources::{HttpUpstream, SourceContext, default_catalog};

use crate::cli::{Cli, Command, describe_selection};

/// Exit codes for different termination scenarios
///
/// - 0: Command completed (individual slots may still have failed)
/// - 1: Configuration error or rejected request
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UragExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<UragExitCode> for ExitCode {
    fn from(code: UragExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                UragExitCode::ConfigError.into()
            } else {
                UragExitCode::Success.into()
            };
        }
    };

    let config = cli.to_config();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return UragExitCode::ConfigError.into();
    }

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UragExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UragExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(cli.command, config).await {
            Ok(()) => UragExitCode::Success,
            Err(e) => {
                error!("{}", e);
                exit_code_for(&e)
            }
        }
    });

    result.into()
}

/// Rejected requests and bad configuration are the caller's to fix
fn exit_code_for(error: &anyhow::Error) -> UragExitCode {
    match error.downcast_ref::<urag_core::Error>() {
        Some(urag_core::Error::InvalidArgument(_) | urag_core::Error::Config(_)) => {
            UragExitCode::ConfigError
        }
        _ => UragExitCode::RuntimeError,
    }
}

async fn run(command: Command, config: UragConfig) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = match &config.store {
        StoreConfig::File { path } => Arc::new(FileKvStore::new(path).await?),
        StoreConfig::Memory => Arc::new(MemoryKvStore::new()),
    };

    let share: Arc<dyn ShareChannel> = match &config.share {
        ShareConfig::File { path } => Arc::new(FileShareChannel::new(path)),
        ShareConfig::Memory => Arc::new(MemoryShareChannel::new()),
    };

    let upstream = Arc::new(HttpUpstream::from_config(&config.sources)?);
    let catalog = Arc::new(default_catalog(&SourceContext::new(upstream, store))?);
    info!("Catalog ready: {} source(s)", catalog.len());

    let (resolver, mut events) = ImageResolver::new(catalog, &config.resolver)?;

    match command {
        Command::Sources => {
            for source in resolver.catalog().sources() {
                let species = source
                    .supported_species()
                    .iter()
                    .map(Species::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{:<16} {:<16} {:<9} {}",
                    source.id(),
                    source.display_name(),
                    if source.resolves_ids() { "ids" } else { "id-less" },
                    if species.is_empty() { "any" } else { species.as_str() }
                );
            }
        }

        Command::Fetch {
            source,
            species,
            count,
        } => {
            let request = FetchRequest {
                source,
                species: species.map(Species::new),
                count: count.unwrap_or(config.resolver.default_count),
            };

            let outcome = resolver.fetch_batch(&request).await?;
            print_outcome(&outcome);
            report_failures(&mut events);

            let state = ShareState::from_batch(&outcome, &request);
            state.save(share.as_ref()).await?;
            println!("share: #{}", state.encode());
        }

        Command::Restore => {
            if matches!(config.share, ShareConfig::Memory) {
                warn!("No share file configured; set URAG_SHARE_PATH to restore a batch");
            }

            let Some(state) = ShareState::load(share.as_ref()).await else {
                info!("Nothing to restore");
                return Ok(());
            };

            let request = state.to_request(config.resolver.default_count);
            println!("{}", describe_selection(&request));

            if state.record.is_empty() {
                info!("Shared state has no restorable images");
                return Ok(());
            }

            let outcome = resolver.restore(&state.record).await?;
            print_outcome(&outcome);
            report_failures(&mut events);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &BatchOutcome) {
    for slot in &outcome.slots {
        let species = slot.species.as_ref().map(Species::as_str).unwrap_or("-");
        match slot.image() {
            Some(image) => println!(
                "[{}] {} {} {}",
                slot.slot, slot.source_id, species, image.image_url
            ),
            None => println!("[{}] {} {} (failed)", slot.slot, slot.source_id, species),
        }
    }
}

/// Surface one notification per failed slot
fn report_failures(events: &mut mpsc::Receiver<ResolverEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ResolverEvent::SlotFailed { slot, error, .. } = event {
            eprintln!("slot {}: {}", slot, error);
        }
    }
}

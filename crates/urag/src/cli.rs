//! Command-line arguments
//!
//! Every option also reads an environment variable, so the harness can be
//! configured the way a deployment would configure it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use urag_core::{FetchRequest, ShareConfig, StoreConfig, UragConfig};

#[derive(Debug, Parser)]
#[command(
    name = "urag",
    version,
    about = "Random animal image generator",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Key/value store file for bulk-dataset caches (in memory when unset).
    #[arg(long, env = "URAG_STATE_PATH", value_name = "PATH", global = true)]
    pub state_path: Option<PathBuf>,

    /// File holding the shareable state (in memory when unset).
    #[arg(long, env = "URAG_SHARE_PATH", value_name = "PATH", global = true)]
    pub share_path: Option<PathBuf>,

    /// CORS relay prefix for sources that need it.
    #[arg(long, env = "URAG_PROXY_BASE", value_name = "URL", global = true)]
    pub proxy_base: Option<String>,

    /// Per-slot timeout in seconds.
    #[arg(long, env = "URAG_SLOT_TIMEOUT_SECS", value_name = "SECS", global = true)]
    pub slot_timeout_secs: Option<u64>,

    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, env = "URAG_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch a batch of random images.
    Fetch {
        /// Only draw from this source.
        #[arg(long, env = "URAG_SOURCE")]
        source: Option<String>,

        /// Only draw this species.
        #[arg(long, env = "URAG_SPECIES")]
        species: Option<String>,

        /// Number of images.
        #[arg(long, env = "URAG_COUNT")]
        count: Option<usize>,
    },

    /// Re-resolve the images recorded in the share file.
    Restore,

    /// List the registered sources and their species.
    Sources,
}

impl Cli {
    /// Library configuration for these arguments
    pub fn to_config(&self) -> UragConfig {
        let mut config = UragConfig::new();

        if let Some(path) = &self.state_path {
            config.store = StoreConfig::File {
                path: path.display().to_string(),
            };
        }
        if let Some(path) = &self.share_path {
            config.share = ShareConfig::File {
                path: path.display().to_string(),
            };
        }
        if let Some(proxy_base) = &self.proxy_base {
            config.sources.proxy_base = proxy_base.clone();
        }
        config.resolver.slot_timeout_secs = self.slot_timeout_secs;

        config
    }
}

/// One-line summary of a restored selection, in `fetch` flag terms
pub fn describe_selection(request: &FetchRequest) -> String {
    format!(
        "selection: --source {} --species {} --count {}",
        request.source.as_deref().unwrap_or("any"),
        request.species.as_ref().map(|s| s.as_str()).unwrap_or("any"),
        request.count
    )
}

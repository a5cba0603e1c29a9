//! CLI argument parsing and configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{resolve_config_dir, SessionOverrides};
use crate::error::{Error, Result};
use crate::registry::parse_beatmapset_id;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Watch osu! beatmapsets and get alerted when their ranked status changes
#[derive(Debug, Parser)]
#[command(name = "mapwatch-tui", version, about)]
#[command(after_help = "Examples:
  mapwatch-tui                                   # Open the TUI
  mapwatch-tui 1234567                           # Track a beatmapset by id
  mapwatch-tui https://osu.ppy.sh/beatmapsets/1  # Track by URL
  mapwatch-tui --headless -i 5000                # Poll every 5s, print changes")]
struct Args {
    /// Beatmapset ids or URLs to start tracking
    #[arg(value_name = "BEATMAPSET")]
    beatmapsets: Vec<String>,

    /// Directory holding config.json and history.db
    #[arg(long, env = "MAPWATCH_CONFIG_DIR", value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Check interval in milliseconds for this run
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    /// Disable the alert bell for this run
    #[arg(long)]
    no_sound: bool,

    /// Poll without the TUI and print status changes to stdout
    #[arg(long)]
    headless: bool,

    /// Skip interactive prompts
    #[arg(short = 'y', long = "yes")]
    skip_prompts: bool,
}

/// Configuration from CLI arguments
#[derive(Debug)]
pub struct CliConfig {
    pub config_dir: PathBuf,
    pub overrides: SessionOverrides,
    pub add_ids: Vec<u64>,
    pub headless: bool,
    pub skip_prompts: bool,
}

impl TryFrom<Args> for CliConfig {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let add_ids = args
            .beatmapsets
            .iter()
            .map(|arg| {
                parse_beatmapset_id(arg).ok_or_else(|| {
                    Error::InvalidArgument(format!("not a beatmapset id or URL: {arg}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config_dir: resolve_config_dir(args.config_dir)?,
            overrides: SessionOverrides {
                check_interval_ms: args.interval,
                sound_enabled: args.no_sound.then_some(false),
            },
            add_ids,
            headless: args.headless,
            skip_prompts: args.skip_prompts,
        })
    }
}

/// Parse CLI arguments and return configuration
pub fn parse_args() -> Result<CliConfig> {
    CliConfig::try_from(Args::parse())
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "anchorline")]
#[command(
    author,
    version,
    about = "Interactive Anchorline session driver with a stand-in model"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively; the model echoes your message
    Chat {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print telemetry counters on exit
        #[arg(long)]
        stats: bool,
    },

    /// Run one message through a fresh session and print the decision as JSON
    Analyze {
        /// Message to analyse
        message: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective configuration as YAML
    ShowConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

impl Commands {
    pub fn config_args(&self) -> &ConfigArgs {
        match self {
            Self::Chat { config, .. } | Self::Analyze { config, .. } | Self::ShowConfig { config } => {
                config
            }
        }
    }
}

/// Configuration sources shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Partial YAML configuration merged over the defaults
    #[arg(short, long, env = "ANCHORLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cadence interval (3-10)
    #[arg(short, long)]
    pub interval: Option<u32>,

    /// Opposing-view stance threshold (1-3)
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

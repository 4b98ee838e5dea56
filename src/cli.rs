//! Command-line interface for moodsh
//!
//! Provides argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Live speech emotion tracking
#[derive(Parser, Debug)]
#[command(name = "moodsh", version, about = "Live speech emotion tracking")]
pub struct Cli {
    /// Subcommand to execute (default: listen)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default listen mode
    #[command(flatten)]
    pub listen: ListenArgs,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

/// Options for live tracking
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ListenArgs {
    /// Audio input device (see `moodsh devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Stream from a WAV file instead of the microphone
    #[arg(long, short = 'i', value_name = "WAV")]
    pub input: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long, short = 'n', value_name = "N")]
    pub frames: Option<u64>,

    /// Stop after this much audio. Examples: 30s, 5m, 1h30m
    #[arg(long, short = 'd', value_name = "DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Silence threshold (mean absolute amplitude after normalization)
    #[arg(long, value_name = "ENERGY")]
    pub threshold: Option<f32>,

    /// Number of predictions in the smoothing window
    #[arg(long, value_name = "K")]
    pub depth: Option<usize>,

    /// Frame duration in seconds
    #[arg(long, value_name = "SECONDS")]
    pub frame_secs: Option<f32>,
}

impl ListenArgs {
    /// Combined frame limit from `--frames` and `--duration`, whichever is smaller.
    pub fn frame_limit(&self, frame_secs: f32) -> Option<u64> {
        let from_duration = self.duration.and_then(|d| {
            (frame_secs > 0.0).then(|| (d.as_secs_f64() / f64::from(frame_secs)).ceil() as u64)
        });
        match (self.frames, from_duration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Parse a duration: bare numbers are seconds, anything else goes to `humantime`.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track emotion live and print each change (default)
    Listen(ListenArgs),

    /// Classify a WAV file once and print the ranked emotions
    Classify {
        /// WAV file to classify
        #[arg(value_name = "WAV")]
        file: PathBuf,

        /// Window the clip to this many seconds (pad or center-crop)
        #[arg(long, value_name = "SECONDS")]
        window: Option<f32>,
    },

    /// Print the configured emotion labels with their class indices
    Labels,

    /// List available audio input devices
    Devices,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

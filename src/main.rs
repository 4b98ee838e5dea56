use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use moodsh::app::{run_classify, run_labels, run_listen};
use moodsh::audio::capture::list_devices;
use moodsh::cli::{Cli, Commands, ConfigAction};
use moodsh::config::Config;
use moodsh::output::format_summary;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let color = !cli.json && std::io::stdout().is_terminal();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            listen(config, cli.listen, cli.json, color, cli.verbose).await?;
        }
        Some(Commands::Listen(args)) => {
            let config = load_config(cli.config.as_deref())?;
            listen(config, args, cli.json, color, cli.verbose).await?;
        }
        Some(Commands::Classify { file, window }) => {
            let config = load_config(cli.config.as_deref())?;
            run_classify(config, file, window, cli.json, color).await?;
        }
        Some(Commands::Labels) => {
            let config = load_config(cli.config.as_deref())?;
            run_labels(&config, cli.json)?;
        }
        Some(Commands::Devices) => {
            list_audio_devices(color)?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "moodsh", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Map `-q` / `-v…` to a log level on stderr.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

async fn listen(
    config: Config,
    args: moodsh::cli::ListenArgs,
    json: bool,
    color: bool,
    verbose: u8,
) -> Result<()> {
    if verbose > 0 {
        eprintln!("moodsh {} listening (Ctrl+C to stop)", moodsh::version_string());
    }
    let summary = run_listen(config, args, json, color).await?;
    if verbose > 0 {
        eprintln!("{}", format_summary(&summary));
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/moodsh/config.toml)
/// 3. Built-in defaults
///
/// Environment variable overrides apply on top of all three.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)
                .with_context(|| format!("cannot load config {}", path.display()))?,
            None => Config::default(),
        },
    };
    Ok(config.with_env_overrides())
}

fn list_audio_devices(color: bool) -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        anyhow::bail!("No audio input devices found");
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        if color && device.ends_with("[recommended]") {
            println!("  [{}] {}", idx, device.green());
        } else {
            println!("  [{}] {}", idx, device);
        }
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .or_else(Config::default_path)
                .context("no configuration directory on this platform")?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

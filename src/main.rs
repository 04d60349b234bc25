//! archstrap - Main entry point

mod cli;

use std::path::Path;

use anyhow::Context;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use archstrap::logic::{self, Phase};
use archstrap::prompt::Console;
use archstrap::{InstallerConfig, InstallerError, SystemRunner, sanity, signals};

use crate::cli::{Cli, Commands};

/// Initialize tracing on stderr; RUST_LOG overrides the verbosity flag.
fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<InstallerConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            InstallerConfig::load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {:?}", path))?
        }
        None => InstallerConfig::default(),
    };
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Run one installation phase against the real system and terminal.
fn run_phase(
    phase: Phase,
    config: &InstallerConfig,
    skip_preflight: bool,
) -> archstrap::Result<()> {
    if skip_preflight {
        warn!("Pre-flight checks skipped");
    } else {
        sanity::run_preflight_checks(phase);
    }

    let mut runner = SystemRunner::new();

    let mut console = Console::stdio();
    match phase {
        Phase::Bootstrap => {
            logic::bootstrap::run(&mut console, &mut runner, config)?;
            println!("\nBootstrap complete. Run `archstrap configure` inside arch-chroot next.");
        }
        Phase::Configure => {
            let report = logic::postinstall::run(&mut console, &mut runner, config)?;
            println!("\nConfiguration complete.");
            for step in report.not_implemented() {
                println!("  still to do by hand: {}", step);
            }
        }
    }
    Ok(())
}

/// Load the configuration, run `phase`, and exit with the failure's status code.
fn install(phase: Phase, config_path: Option<&Path>, skip_preflight: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if let Err(e) = run_phase(phase, &config, skip_preflight) {
        match &e {
            InstallerError::Cancelled => println!("\nInstallation cancelled."),
            _ => {
                error!(%phase, "{}", e);
                eprintln!("✗ {} failed: {}", phase, e);
            }
        }
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    info!("archstrap {} starting up", env!("CARGO_PKG_VERSION"));

    if let Err(e) = signals::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    match cli.command {
        Commands::Validate { file } => {
            info!("Validating configuration file: {:?}", file);
            match load_config(Some(file.as_path())) {
                Ok(_) => println!("✓ Configuration file is valid: {:?}", file),
                Err(e) => {
                    error!("{:#}", e);
                    eprintln!("✗ {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::PrintConfig => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", config.to_json()?);
        }
        Commands::Bootstrap => {
            install(Phase::Bootstrap, cli.config.as_deref(), cli.skip_preflight)?
        }
        Commands::Configure => {
            install(Phase::Configure, cli.config.as_deref(), cli.skip_preflight)?
        }
    }

    Ok(())
}

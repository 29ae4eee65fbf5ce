use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phi_daemon::config::{Config, OutputFormat};
use phi_daemon::driver::{self, ExitPolicy};
use phi_daemon::render::render;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "phi")]
#[command(about = "Staged activation simulator: processes, a main complex and the experience they specify")]
struct Cli {
    /// Config file (default: ~/.phi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Milliseconds between activation stages (overrides the config file)
    #[arg(long, global = true)]
    stage_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one activation sequence in real time
    Run,
    /// Run one activation sequence on virtual time, without waiting
    Simulate {
        /// Stop virtual time here instead of at completion
        #[arg(long)]
        until_ms: Option<u64>,
    },
    /// Read start / reset / status / quit commands from stdin
    Interactive,
    /// Print the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
        /// With --init, replace an existing file
        #[arg(long, requires = "init")]
        force: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(interval) = cli.stage_interval_ms {
        config.simulation.stage_interval_ms = interval;
    }
    config
        .simulation
        .validate()
        .context("invalid --stage-interval-ms")?;
    Ok(config)
}

async fn run_once(config: &Config) -> Result<()> {
    let mut spawned = driver::spawn(config.simulation.clone(), ExitPolicy::AfterRun)?;
    spawned.handle.start();

    while let Some(state) = spawned.snapshots.recv().await {
        println!("{}", render(&state, config.output.format));
    }
    spawned.task.await.context("driver task failed")?;
    Ok(())
}

fn simulate(config: &Config, until_ms: Option<u64>) -> Result<()> {
    let snapshots = driver::fast_forward(config.simulation.clone(), until_ms)?;
    info!(snapshots = snapshots.len(), "Virtual-time run finished");
    for state in &snapshots {
        println!("{}", render(state, config.output.format));
    }
    Ok(())
}

async fn interactive(config: &Config) -> Result<()> {
    let mut spawned = driver::spawn(config.simulation.clone(), ExitPolicy::UntilShutdown)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest = None;

    println!("commands: start | reset | status | quit");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.context("reading stdin")?;
                match line.as_deref().map(str::trim) {
                    Some("start") => {
                        spawned.handle.start();
                    }
                    Some("reset") => {
                        spawned.handle.reset();
                    }
                    Some("status") => match &latest {
                        Some(state) => println!("{}", render(state, config.output.format)),
                        None => println!("no snapshot yet"),
                    },
                    Some("quit") | Some("exit") | None => {
                        spawned.handle.shutdown();
                        break;
                    }
                    Some("") => {}
                    Some(other) => warn!(input = other, "Unknown command"),
                }
            }
            state = spawned.snapshots.recv() => match state {
                Some(state) => {
                    println!("{}", render(&state, config.output.format));
                    latest = Some(state);
                }
                None => break,
            },
        }
    }

    // Flush whatever was published before the shutdown was processed
    while let Some(state) = spawned.snapshots.recv().await {
        println!("{}", render(&state, config.output.format));
    }
    spawned.task.await.context("driver task failed")?;
    Ok(())
}

fn show_config(cli: &Cli, init: bool, force: bool) -> Result<()> {
    if init {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::get_config_path()?,
        };
        Config::write_default(&path, force)?;
        info!(path = %path.display(), "Default configuration written");
        return Ok(());
    }
    let config = load_config(cli)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn execute(cli: Cli) -> Result<()> {
    if let Commands::Config { init, force } = cli.command {
        return show_config(&cli, init, force);
    }

    let config = load_config(&cli)?;
    info!(config = ?config, "Starting phi with configuration");

    match cli.command {
        Commands::Simulate { until_ms } => simulate(&config, until_ms),
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
            rt.block_on(run_once(&config))
        }
        Commands::Interactive => {
            let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
            rt.block_on(interactive(&config))
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn main() {
    // Structured logging on stderr; stdout carries the snapshots
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        error!(error = %format!("{e:#}"), "Fatal Error");
        std::process::exit(1);
    }
}

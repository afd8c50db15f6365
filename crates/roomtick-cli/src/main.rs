//! Roomtick CLI - run simulation ticks over room snapshot files.
//!
//! - `roomtick tick <room.json>` - run one room and print the flushed batch
//! - `roomtick run <dir>` - run every room file in a directory as one world tick
//! - `roomtick init` - write a default configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use roomtick_core::{
    CancelSource, EngineConfig, ExitTopology, MemoryStore, RoomJob, RoomState, Terrain,
    TickReport, WorldRunner, CONFIG_PATH,
};

#[derive(Parser)]
#[command(name = "roomtick")]
#[command(about = "Per-room tick simulation engine", version)]
struct Cli {
    /// World directory holding .roomtick/config.yaml
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one tick for a single room file
    Tick {
        /// Room snapshot (JSON)
        room: PathBuf,
    },

    /// Run one world tick over every room file in a directory
    Run {
        /// Directory of room snapshots (*.json)
        dir: PathBuf,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

/// A room snapshot on disk. Exits default to the ones implied by the room
/// name and terrain border.
#[derive(Deserialize)]
struct RoomFile {
    #[serde(flatten)]
    state: RoomState,
    #[serde(default)]
    exits: Option<ExitTopology>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    #[cfg(feature = "json-logs")]
    fmt().json().with_env_filter(filter).with_target(false).init();
    #[cfg(not(feature = "json-logs"))]
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project_root = match cli.project {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Tick { room } => tick_room(&project_root, &room).await,
        Commands::Run { dir, json } => run_world(&project_root, &dir, json).await,
        Commands::Init { force } => init_project(&project_root, force),
    }
}

async fn load_room(path: &Path, config: &EngineConfig) -> Result<RoomJob> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read room from {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse room from {}", path.display()))?;

    // Rooms without a terrain string are open plains of the configured size.
    if let Some(object) = value.as_object_mut() {
        if !object.contains_key("terrain") {
            let terrain = Terrain::plain(config.room_size);
            object.insert("terrain".to_string(), serde_json::to_value(terrain)?);
        }
    }

    let file: RoomFile = serde_json::from_value(value)
        .with_context(|| format!("Invalid room snapshot in {}", path.display()))?;
    Ok(match file.exits {
        Some(exits) => RoomJob {
            state: file.state,
            exits,
        },
        None => RoomJob::from_state(file.state),
    })
}

async fn run_jobs(config: EngineConfig, jobs: Vec<RoomJob>) -> Result<TickReport> {
    let store = Arc::new(MemoryStore::new());
    futures::future::join_all(jobs.iter().map(|job| store.seed(&job.state))).await;

    let runner = WorldRunner::new(config, store);
    let cancel = CancelSource::new();
    let token = cancel.token();

    tokio::select! {
        report = runner.run_tick(jobs, &token) => Ok(report?),
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            anyhow::bail!("Interrupted")
        }
    }
}

async fn tick_room(project_root: &Path, room: &Path) -> Result<()> {
    let config = EngineConfig::load_from_dir(project_root)?;
    let job = load_room(room, &config).await?;
    tracing::info!(room = %job.state.room, tick = job.state.tick, "Running room tick");

    let report = run_jobs(config, vec![job]).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_world(project_root: &Path, dir: &Path, json: bool) -> Result<()> {
    let config = EngineConfig::load_from_dir(project_root)?;

    let mut paths = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        tracing::info!(dir = %dir.display(), "No room files found");
        return Ok(());
    }

    let jobs =
        futures::future::try_join_all(paths.iter().map(|path| load_room(path, &config))).await?;
    tracing::info!(rooms = jobs.len(), "Running world tick");
    let report = run_jobs(config, jobs).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("World tick");
    println!("==========");
    println!();
    for outcome in &report.rooms {
        println!(
            "  {} (tick {}): {} changes, {} notifications",
            outcome.room,
            outcome.tick,
            outcome.batch.changes.len(),
            outcome.notifications.len()
        );
    }
    println!();
    println!("Cross-room mutations: {}", report.global.len());
    Ok(())
}

fn init_project(project_root: &Path, force: bool) -> Result<()> {
    let config_path = project_root.join(CONFIG_PATH);
    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    EngineConfig::default().save_to_dir(project_root)?;

    println!("Initialized roomtick world at {}", project_root.display());
    println!();
    println!("Created:");
    println!("  {CONFIG_PATH} - engine configuration");
    println!();
    println!("Next steps:");
    println!("  1. Put room snapshots (*.json) in a directory");
    println!("  2. Run: roomtick run <dir>");

    Ok(())
}

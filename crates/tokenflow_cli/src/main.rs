//! Tokenflow CLI
//!
//! Fire a Petri net against the oracle and play the token flow headlessly.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenflow_animation::{FrameSignal, SystemClock};
use tokenflow_core::{build_path, Net, NodeId};
use tokenflow_engine::{EngineConfig, FiringOrchestrator, FiringOutcome};
use tokenflow_oracle::{HttpOracle, NetPayload};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[derive(Parser)]
#[command(name = "tokenflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Petri net token-flow player", long_about = None)]
struct Cli {
    /// Config file (defaults to ./tokenflow.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fire the net once and play the result
    Fire {
        /// Net in JSON page format
        net: PathBuf,
    },

    /// Fire the net and settle a conflict with the given transition
    Resolve {
        /// Net in JSON page format
        net: PathBuf,

        /// Transition to fire when a conflict arises
        #[arg(short, long)]
        transition: String,
    },

    /// Print every arc's path without contacting the oracle
    Paths {
        /// Net in JSON page format
        net: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fire { net } => cmd_fire(&config, &net, None).await,
        Commands::Resolve { net, transition } => {
            cmd_fire(&config, &net, Some(NodeId::from(transition))).await
        }
        Commands::Paths { net } => cmd_paths(&config, &net),
    }
}

async fn cmd_fire(config: &EngineConfig, path: &Path, choice: Option<NodeId>) -> Result<()> {
    let mut net = config::load_net(path)?;
    let oracle = HttpOracle::new(config.oracle.clone()).context("Invalid oracle endpoint")?;
    let frames = FrameSignal::new();
    let mut engine = FiringOrchestrator::new(
        oracle,
        Arc::new(SystemClock::new()),
        Arc::new(frames.clone()),
        config,
    );

    info!("Firing {} via {}", path.display(), config.oracle.process_url());
    let mut outcome = engine.fire(&mut net).await?;

    if let FiringOutcome::Conflict(candidates) = &outcome {
        let Some(choice) = choice else {
            anyhow::bail!(
                "Conflict between {:?}; rerun with `tokenflow resolve --transition <id>`",
                candidates
            );
        };
        info!("Resolving conflict with {}", choice);
        outcome = engine.resolve(&mut net, &choice).await?;
    } else if choice.is_some() {
        warn!("No conflict arose; the requested transition was ignored");
    }

    match &outcome {
        FiringOutcome::Animating { fired, scheduled } => {
            info!("Playing {} token legs for {:?}", scheduled, fired);
        }
        FiringOutcome::Conflict(candidates) => {
            warn!("Still in conflict between {:?}", candidates);
        }
        FiringOutcome::Rejected => {
            for notice in engine.notices() {
                warn!("{}", notice);
            }
        }
    }

    play(&mut engine, &frames, &mut net, config).await;

    let json = serde_json::to_string_pretty(&NetPayload::from_net(&net))?;
    println!("{}", json);
    Ok(())
}

/// Frame loop: tick whenever the scheduler asked for a frame
async fn play<O: tokenflow_oracle::Oracle>(
    engine: &mut FiringOrchestrator<O>,
    frames: &FrameSignal,
    net: &mut Net,
    config: &EngineConfig,
) {
    let interval = config.timing.frame_interval();
    while engine.has_active_animations() {
        tokio::time::sleep(interval).await;
        if frames.take() {
            engine.on_frame(net);
        }
    }
}

fn cmd_paths(config: &EngineConfig, path: &Path) -> Result<()> {
    let net = config::load_net(path)?;

    for arc in net.arcs() {
        let (Some(source), Some(target)) = (net.element(&arc.source), net.element(&arc.target))
        else {
            warn!("Arc {} has a missing endpoint", arc.id);
            continue;
        };
        let flow = build_path(&source, &target, arc, net.arcs(), &config.path);
        println!(
            "{}\t{:?}\t{:.1}\t{}",
            arc.id,
            arc.kind,
            flow.length(),
            flow.to_svg()
        );
    }
    Ok(())
}

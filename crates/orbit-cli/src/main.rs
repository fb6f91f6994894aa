//! Orbit CLI - explore a graph fixture from the terminal.
//!
//! Drives the same explorer a renderer would, over a JSON fixture loaded
//! into an in-memory store.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(author = "Orbit Contributors")]
#[command(version)]
#[command(about = "Budgeted, interactive graph exploration", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Explorer config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Restrict loads to one partition
    #[arg(short, long, global = true)]
    partition: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a fixture contains
    Stats {
        /// Fixture file
        fixture: PathBuf,
    },

    /// Load the global view or a node's neighborhood
    Load {
        /// Fixture file
        fixture: PathBuf,

        /// Center node ("id", "primary:id" or "secondary:id")
        #[arg(long)]
        center: Option<String>,

        /// Hops around the center
        #[arg(long)]
        hops: Option<u32>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Load a neighborhood, then expand one of its nodes
    Expand {
        /// Fixture file
        fixture: PathBuf,

        /// Center of the initial neighborhood
        center: String,

        /// Node to expand
        anchor: String,

        /// Only fetch the anchor's owned children
        #[arg(long)]
        children_only: bool,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Run the force layout until it settles and print positions
    Layout {
        /// Fixture file
        fixture: PathBuf,

        /// Center node; loads the global view when omitted
        #[arg(long)]
        center: Option<String>,

        /// Upper bound on simulation ticks
        #[arg(long, default_value = "600")]
        max_ticks: u32,

        /// Write positions to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show relevance around a selected node
    Lens {
        /// Fixture file
        fixture: PathBuf,

        /// Node to select
        select: String,

        /// Relevance depth
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let options = commands::Options {
        config: cli.config,
        partition: cli.partition,
    };

    let result = match cli.command {
        Commands::Stats { fixture } => commands::stats(&fixture, &options),
        Commands::Load {
            fixture,
            center,
            hops,
            json,
        } => commands::load(&fixture, &options, center.as_deref(), hops, json).await,
        Commands::Expand {
            fixture,
            center,
            anchor,
            children_only,
            json,
        } => commands::expand(&fixture, &options, &center, &anchor, children_only, json).await,
        Commands::Layout {
            fixture,
            center,
            max_ticks,
            output,
        } => {
            commands::layout(
                &fixture,
                &options,
                center.as_deref(),
                max_ticks,
                output.as_deref(),
            )
            .await
        }
        Commands::Lens {
            fixture,
            select,
            depth,
            json,
        } => commands::lens(&fixture, &options, &select, depth, json).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

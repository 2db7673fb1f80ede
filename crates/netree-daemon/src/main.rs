//! netree Daemon - Main entry point
//!
//! Loads the device inventory and serves the REST API used by the
//! topology front-end.

mod api;
mod config;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use netree_core::{DeviceView, Tree};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "netree")]
#[command(about = "Network topology inventory daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netree.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to the JSON device inventory
    #[arg(short, long)]
    data: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the loaded tree and exit
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("netree v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }
    if let Some(data) = args.data {
        config.storage.path = data;
    }

    info!(
        bind = %config.daemon.bind,
        storage = %config.storage.path,
        "Configuration loaded"
    );

    let state = state::AppState::new(&config);

    if args.print {
        let tree = state.tree.read().await;
        print!("{}", outline(&tree));
    } else {
        server::run(state, &config.daemon.bind).await?;
    }

    Ok(())
}

/// Indented outline of the tree, one device per line
fn outline(tree: &Tree) -> String {
    fn walk(view: &DeviceView, depth: usize, out: &mut String) {
        out.push_str(&format!(
            "{}- [{}] {} ({}, {})\n",
            "  ".repeat(depth),
            view.id,
            view.name,
            view.kind,
            view.status
        ));
        for child in &view.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    match tree.get_tree() {
        Some(root) => {
            out.push_str(&format!("{} devices:\n", root.count()));
            walk(&root, 0, &mut out);
        }
        None => out.push_str("No devices\n"),
    }
    out
}

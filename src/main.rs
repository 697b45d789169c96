//! `restrict-ip` command line.
//!
//! Administers the restriction settings and lists, and evaluates requests
//! against them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use restrict_ip::access_control::{
    available_permissions, parse_address_list, EvaluationScope, FileListStore, ListKind,
    ListStore, RequestContext, RequestOutcome, RestrictIpHandler,
};
use restrict_ip::config::{AppConfig, BasicValidator, ConfigLoader};
use restrict_ip::logging::init_logging;

#[derive(Parser)]
#[command(name = "restrict-ip")]
#[command(about = "Restrict access by IP address, path and country")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "restrict-ip.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn restriction on or off
    Toggle {
        /// New state
        state: ToggleState,
    },
    /// Evaluate a request and print the outcome
    Check {
        /// Client address
        #[arg(long)]
        ip: String,
        /// Requested path
        #[arg(long)]
        path: String,
        /// Permission held by the caller (repeatable)
        #[arg(long = "permission")]
        permissions: Vec<String>,
        /// Treat the caller as signed in
        #[arg(long)]
        authenticated: bool,
    },
    /// Print the entries an address list file contains
    Clean {
        /// Address list file
        file: PathBuf,
    },
    /// Store an address list file as the allowlist
    Allow {
        /// Address list file
        file: PathBuf,
        /// Append to the stored list instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Store a path list file as the whitelist or blacklist
    Paths {
        /// Which path list to write
        list: PathList,
        /// Path list file, one pattern per line
        file: PathBuf,
        /// Append to the stored list instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// List the permissions the current settings define
    Permissions,
}

#[derive(Clone, Copy, ValueEnum)]
enum ToggleState {
    Enable,
    Disable,
}

#[derive(Clone, Copy, ValueEnum)]
enum PathList {
    Whitelist,
    Blacklist,
}

impl From<PathList> for ListKind {
    fn from(list: PathList) -> Self {
        match list {
            PathList::Whitelist => ListKind::WhitelistedPaths,
            PathList::Blacklist => ListKind::BlacklistedPaths,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::new().with_validator(BasicValidator::new());
    let config = loader
        .load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    init_logging(&config.logging).context("installing log subscriber")?;

    match cli.command {
        Commands::Toggle { state } => toggle(&loader, config, &cli.config, state),
        Commands::Check {
            ip,
            path,
            permissions,
            authenticated,
        } => check(&config, &ip, &path, permissions, authenticated),
        Commands::Clean { file } => clean(&file),
        Commands::Allow { file, append } => {
            store_list(&config, ListKind::AllowedAddresses, &file, append)
        },
        Commands::Paths { list, file, append } => {
            store_list(&config, list.into(), &file, append)
        },
        Commands::Permissions => {
            for permission in available_permissions(&config.restrict_ip) {
                println!("{permission}");
            }
            Ok(())
        },
    }
}

fn toggle(
    loader: &ConfigLoader,
    mut config: AppConfig,
    path: &Path,
    state: ToggleState,
) -> Result<()> {
    config.restrict_ip.enabled = matches!(state, ToggleState::Enable);
    loader
        .save(&config, path)
        .with_context(|| format!("saving {}", path.display()))?;

    info!(enabled = config.restrict_ip.enabled, "restriction toggled");
    println!(
        "IP restriction {}",
        if config.restrict_ip.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

fn handler(config: &AppConfig) -> RestrictIpHandler {
    let store = Arc::new(FileListStore::new(&config.store.lists_path));
    let handler = RestrictIpHandler::new(config.restrict_ip.clone(), store);
    match config.geo {
        Some(ref geo) => handler.with_geo(Arc::new(geo.lookup())),
        None => handler,
    }
}

fn check(
    config: &AppConfig,
    ip: &str,
    path: &str,
    permissions: Vec<String>,
    authenticated: bool,
) -> Result<()> {
    let handler = handler(config);
    let ctx = RequestContext::new(ip, path).with_permissions(permissions);

    let mut scope = EvaluationScope::new();
    let decision = handler.decide(&mut scope, &ctx);

    match handler.outcome(&ctx, &decision) {
        RequestOutcome::Pass if decision.is_blocked() => {
            println!("pass (blocked visitor on the denial page)");
        },
        RequestOutcome::Pass => println!("pass"),
        RequestOutcome::Redirect { location, action } => {
            println!("redirect {location} ({action:?})");
        },
    }

    if decision.is_blocked() {
        println!("{:#?}", handler.denied_page(&decision, authenticated));
    }
    Ok(())
}

fn clean(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    for entry in parse_address_list(&raw) {
        println!("{entry}");
    }
    Ok(())
}

fn store_list(config: &AppConfig, kind: ListKind, file: &Path, append: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let entries = kind.parse_entries(&raw);

    let store = FileListStore::new(&config.store.lists_path);
    store
        .save(kind, &entries, !append)
        .with_context(|| format!("saving {kind}"))?;

    println!("{} entries saved to {kind}", entries.len());
    Ok(())
}

//! # kfleet
//!
//! Command-line front end: inspect and edit firmware configuration profiles
//! for a source tree, and keep track of which device uses which profile.

#![deny(unsafe_code)]

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kfleet_registry::Registry;
use kfleet_settings::LogLevel;

/// Firmware configuration fleet tool.
#[derive(Parser, Debug)]
#[command(name = "kfleet", about = "Firmware configuration fleet tool")]
struct Cli {
    /// Firmware source tree (overrides settings).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Settings file (defaults to `~/.kfleet/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the visible configuration tree as JSON.
    Tree {
        /// Root definition file, relative to the source tree.
        #[arg(long)]
        definition: Option<PathBuf>,
        /// Existing profile to start from.
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Include hidden optional features.
        #[arg(long)]
        optional: bool,
    },
    /// Apply `NAME=VALUE` assignments to a profile.
    Set {
        /// Root definition file, relative to the source tree.
        #[arg(long)]
        definition: Option<PathBuf>,
        /// Profile to start from.
        #[arg(long)]
        profile: PathBuf,
        /// Where to write the result (defaults to the input profile).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Assignments, applied in order.
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Manage the device registry.
    Fleet {
        #[command(subcommand)]
        command: FleetCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FleetCommand {
    /// List registered devices.
    List,
    /// Register a device, or update an existing one.
    Add {
        /// Device id.
        #[arg(long)]
        id: String,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Profile path.
        #[arg(long)]
        profile: Option<String>,
    },
    /// Remove a device.
    Remove {
        /// Device id.
        id: String,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(kfleet_settings::settings_path);
    let settings = kfleet_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        settings.logging.level
    };
    logging::init_subscriber(level.as_filter_str());

    let _ = kfleet_settings::init_settings(settings);
    let settings = kfleet_settings::get_settings();
    let root = args
        .root
        .unwrap_or_else(|| PathBuf::from(&settings.menu.source_root));

    match args.command {
        Command::Tree {
            definition,
            profile,
            optional,
        } => commands::tree(
            settings,
            &root,
            definition.as_deref(),
            profile.as_deref(),
            optional || settings.menu.show_optional,
        ),
        Command::Set {
            definition,
            profile,
            output,
            assignments,
        } => commands::set(
            settings,
            &root,
            definition.as_deref(),
            &profile,
            output.as_deref(),
            &assignments,
        ),
        Command::Fleet { command } => {
            let registry =
                Registry::from_settings(&settings.fleet).context("Failed to open fleet registry")?;
            match command {
                FleetCommand::List => commands::fleet_list(&registry),
                FleetCommand::Add { id, name, profile } => {
                    commands::fleet_add(&registry, id, name, profile)
                }
                FleetCommand::Remove { id } => commands::fleet_remove(&registry, &id),
            }
        }
    }
}

//! CLI module - Command-line interface for Anidex
//!
//! This module provides a structured CLI using clap for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Anidex - read-only anime catalog server
#[derive(Parser, Debug)]
#[command(name = "anidex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load the catalog and serve the HTTP API (default)
    #[command(alias = "run")]
    Serve {
        /// Catalog file, overrides `catalog.path`
        #[arg(long, short)]
        catalog: Option<PathBuf>,

        /// Listen port, overrides `server.port`
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Load and validate the catalog, then exit
    #[command(alias = "c")]
    Check {
        /// Catalog file, overrides `catalog.path`
        #[arg(long, short)]
        catalog: Option<PathBuf>,
    },

    /// Create a default config.toml
    Init,
}

impl Cli {
    /// The command to run, `serve` when none was given.
    #[must_use]
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve {
            catalog: None,
            port: None,
        })
    }
}

impl Commands {
    /// Applies command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        match self {
            Self::Serve { catalog, port } => {
                if let Some(path) = catalog {
                    config.catalog.path = path.display().to_string();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
            }
            Self::Check { catalog } => {
                if let Some(path) = catalog {
                    config.catalog.path = path.display().to_string();
                }
            }
            Self::Init => {}
        }
    }
}

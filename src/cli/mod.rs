// src/cli/mod.rs

use crate::core::paths::PathStyle;
use crate::settings::Settings;
use clap::{Parser, Subcommand};

pub mod args;
pub mod handlers;

use args::{ResolveArgs, RoundtripArgs, ShowArgs};

/// hydrolib: inspect and rewrite the INI-like input files of hydrodynamic models.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Do not repair the casing of paths against the filesystem.
    #[arg(long, global = true)]
    pub no_casing: bool,

    /// Separator convention of the references inside the files ('unix' or 'windows').
    #[arg(long, global = true)]
    pub path_style: Option<PathStyle>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parses a file and prints its content.
    Show(ShowArgs),
    /// Loads a file and saves it to another location.
    Roundtrip(RoundtripArgs),
    /// Prints a path with repaired casing, in the requested path style.
    Resolve(ResolveArgs),
}

impl Cli {
    /// Applies the global flags on top of the user settings.
    pub fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if self.no_casing {
            settings.load.resolve_casing = false;
        }
        if let Some(style) = self.path_style {
            settings.load.path_style = style;
        }
        settings
    }
}

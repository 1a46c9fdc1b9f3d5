// src/cli/handlers/resolve.rs

use super::expand_path;
use crate::cli::args::ResolveArgs;
use crate::core::paths::{self, PathStyle};
use crate::settings::Settings;
use anyhow::Result;
use colored::Colorize;
use std::env;

pub fn handle(args: ResolveArgs, settings: &Settings) -> Result<()> {
    let raw = expand_path(&args.path)?;
    let input = paths::convert_to_os_style(&raw.to_string_lossy(), settings.load.path_style);
    let absolute = paths::normalize(&env::current_dir()?.join(&input));

    let resolved = if settings.load.resolve_casing {
        paths::resolve_casing(&absolute)
    } else {
        absolute
    };
    let style = args.to.unwrap_or_else(PathStyle::current);

    if !resolved.exists() {
        log::warn!("'{}' does not exist", resolved.display());
    }
    println!("{:>9}: {}", "Resolved".cyan(), resolved.display());
    println!(
        "{:>9}: {}",
        style.to_string().cyan(),
        paths::convert_from_os_style(&resolved, style)
    );
    Ok(())
}

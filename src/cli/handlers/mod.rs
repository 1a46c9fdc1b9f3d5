// src/cli/handlers/mod.rs

use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod resolve;
pub mod roundtrip;
pub mod show;

/// Expands `~` and environment variables in a path given on the command line.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("Could not expand path '{}'", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

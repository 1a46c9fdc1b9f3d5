// src/cli/args.rs

use crate::core::paths::PathStyle;
use clap::Args;

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// The file to parse.
    pub file: String,

    /// Print the parsed document as JSON instead of INI text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct RoundtripArgs {
    /// The file to load.
    pub input: String,

    /// Where to save it.
    pub output: String,
}

#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// The path to resolve.
    pub path: String,

    /// Path style to render the result in. Defaults to the style of this system.
    #[arg(long)]
    pub to: Option<PathStyle>,
}

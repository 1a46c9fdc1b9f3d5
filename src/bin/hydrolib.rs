// src/bin/hydrolib.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use hydrolib::cli::{Cli, Command, handlers};
use hydrolib::settings::Settings;

/// Sets up logging, parses arguments, dispatches to the handler and reports errors.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let settings = cli.apply_overrides(Settings::load()?);
    log::debug!("Effective settings: {:?}", settings);

    match cli.command {
        Command::Show(args) => handlers::show::handle(args, &settings),
        Command::Roundtrip(args) => handlers::roundtrip::handle(args, &settings),
        Command::Resolve(args) => handlers::resolve::handle(args, &settings),
    }
}

// src/cli/handlers/roundtrip.rs

use super::expand_path;
use crate::cli::args::RoundtripArgs;
use crate::core::file_model::FileModel;
use crate::core::parsable::IniFileModel;
use crate::core::save::SaveOptions;
use crate::settings::Settings;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn handle(args: RoundtripArgs, settings: &Settings) -> Result<()> {
    let input = expand_path(&args.input)?;
    let output = expand_path(&args.output)?;

    let model = IniFileModel::load_with(&input, settings.load)
        .with_context(|| format!("Could not load '{}'", input.display()))?;

    let options = SaveOptions::new()
        .with_filepath(&output)
        .with_path_style(settings.load.path_style)
        .with_serializer(settings.serializer.clone());
    model
        .borrow_mut()
        .save(&options)
        .with_context(|| format!("Could not save '{}'", output.display()))?;

    println!(
        "{} '{}' -> '{}'",
        "Saved".green().bold(),
        input.display(),
        output.display()
    );
    Ok(())
}

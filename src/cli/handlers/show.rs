// src/cli/handlers/show.rs

use super::expand_path;
use crate::cli::args::ShowArgs;
use crate::core::file_model::FileModel;
use crate::core::parsable::{IniFileModel, ParsableFileModel};
use crate::core::save::SaveOptions;
use crate::settings::Settings;
use anyhow::{Context, Result};

pub fn handle(args: ShowArgs, settings: &Settings) -> Result<()> {
    let path = expand_path(&args.file)?;
    log::debug!("Showing '{}'", path.display());

    let model = IniFileModel::load_with(&path, settings.load)
        .with_context(|| format!("Could not load '{}'", path.display()))?;
    let model = model.borrow();

    if args.json {
        let json = serde_json::to_string_pretty(&*model)?;
        println!("{}", json);
    } else {
        let save_settings = SaveOptions::new()
            .with_path_style(settings.load.path_style)
            .with_serializer(settings.serializer.clone())
            .settings();
        print!("{}", model.serialize(&save_settings)?);
    }
    Ok(())
}

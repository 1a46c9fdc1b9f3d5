// src/core/disk_only.rs

use crate::core::base::{FileModelError, Model};
use crate::core::context::FileLoadContext;
use crate::core::file_model::{FileInfo, FileModel};
use crate::core::save::SaveSettings;
use crate::file_node_accessors;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// A file that is never parsed, only carried along and copied on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskOnlyFileModel {
    pub file: FileInfo,
}

impl DiskOnlyFileModel {
    pub fn new(filepath: impl AsRef<Path>) -> Self {
        Self {
            file: FileInfo::new(filepath.as_ref()),
        }
    }

    /// True if the source can be copied to `target`: the source is an existing file,
    /// `target` is not the source itself, and `target` is not newer than the source.
    pub fn can_copy_to(&self, target: &Path) -> bool {
        let Some(source) = self.file.source_path.as_deref() else {
            return false;
        };
        if !source.is_file() {
            warn!("Cannot copy '{}': source file does not exist.", source.display());
            return false;
        }
        if is_same_file(source, target) {
            return false;
        }
        if let (Ok(source_meta), Ok(target_meta)) = (fs::metadata(source), fs::metadata(target))
            && let (Ok(source_time), Ok(target_time)) =
                (source_meta.modified(), target_meta.modified())
            && target_time > source_time
        {
            warn!(
                "Not overwriting '{}': it is newer than '{}'.",
                target.display(),
                source.display()
            );
            return false;
        }
        true
    }
}

fn is_same_file(left: &Path, right: &Path) -> bool {
    match (dunce::canonicalize(left), dunce::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

/// Gives `target` the modification time of `source`. Platforms without settable
/// timestamps keep the copy time.
fn copy_modified_time(source: &Path, target: &Path) -> Result<(), FileModelError> {
    let Ok(modified) = fs::metadata(source).and_then(|meta| meta.modified()) else {
        return Ok(());
    };
    let file = fs::File::options()
        .write(true)
        .open(target)
        .map_err(|e| FileModelError::io(target, e))?;
    if let Err(e) = file.set_modified(modified) {
        debug!("Could not keep modification time of '{}': {}", target.display(), e);
    }
    Ok(())
}

impl Model for DiskOnlyFileModel {
    file_node_accessors!();
}

impl FileModel for DiskOnlyFileModel {
    type Raw = ();

    fn ext() -> &'static str {
        ""
    }

    fn file_info(&self) -> &FileInfo {
        &self.file
    }

    fn file_info_mut(&mut self) -> &mut FileInfo {
        &mut self.file
    }

    fn load_raw(_path: &Path) -> Result<Self::Raw, FileModelError> {
        Ok(())
    }

    fn from_raw(_raw: (), _context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        Ok(Self::default())
    }

    /// Copies the source file to `target`. Saving onto the source is a no-op.
    fn write(&self, target: &Path, _settings: &SaveSettings) -> Result<(), FileModelError> {
        if !self.can_copy_to(target) {
            debug!("Skipping copy to '{}'", target.display());
            return Ok(());
        }
        let Some(source) = self.file.source_path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| FileModelError::io(parent, e))?;
        }
        debug!("Copying '{}' to '{}'", source.display(), target.display());
        fs::copy(source, target).map_err(|e| FileModelError::io(target, e))?;
        copy_modified_time(source, target)
    }
}

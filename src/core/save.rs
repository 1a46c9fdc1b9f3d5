// src/core/save.rs

//! Writing model trees back to disk.
//!
//! A recursive save runs two walks: one that gives every file model without a path its
//! default name, and one that recomputes each file's anchor from its parents and writes
//! it. Shared files are written once.

use crate::core::base::{Model, VisitResult};
use crate::core::file_model::{FileInfo, FileNode, FileState};
use crate::core::paths::{
    FilePathResolver, PathStyle, ResolveRelativeMode, convert_from_os_style, relative_to,
};
use crate::core::traverser::ModelTreeTraverser;
use crate::ini::serializer::SerializerConfig;
use log::debug;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

/// Save-time flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// New path of the saved model. Without `recurse` its children stay where they are
    /// and the written references point back at them.
    pub filepath: Option<PathBuf>,
    /// Also save every file model below this one.
    pub recurse: bool,
    /// Style of the file references written; defaults to the OS style.
    pub path_style: Option<PathStyle>,
    /// Leave out fields that are not set instead of writing them empty.
    pub exclude_unset: bool,
    pub serializer: SerializerConfig,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filepath(mut self, filepath: impl Into<PathBuf>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }

    pub fn recursive(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_path_style(mut self, path_style: PathStyle) -> Self {
        self.path_style = Some(path_style);
        self
    }

    pub fn excluding_unset(mut self, exclude_unset: bool) -> Self {
        self.exclude_unset = exclude_unset;
        self
    }

    pub fn with_serializer(mut self, serializer: SerializerConfig) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn settings(&self) -> SaveSettings {
        SaveSettings {
            path_style: self.path_style.unwrap_or_default(),
            exclude_unset: self.exclude_unset,
            serializer: self.serializer.clone(),
            reference_base: None,
        }
    }
}

/// What an individual file model needs to know while writing itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSettings {
    pub path_style: PathStyle,
    pub exclude_unset: bool,
    pub serializer: SerializerConfig,
    /// Directory the references of the file being written resolve against. Set by the
    /// save walk for each file it writes.
    pub reference_base: Option<PathBuf>,
}

impl SaveSettings {
    /// Renders a file reference in the configured path style.
    pub fn render_path(&self, path: &Path) -> String {
        convert_from_os_style(path, self.path_style)
    }

    /// How the file being written should spell its reference to `child`.
    ///
    /// A child with a known anchor is spelled relative to `reference_base`, so parents
    /// in different directories sharing one child each point at it correctly. Absolute
    /// references and children without an anchor keep their path as set.
    pub fn reference_path(&self, child: &FileInfo) -> Option<PathBuf> {
        let filepath = child.filepath.as_ref()?;
        if filepath.is_absolute() || child.absolute_anchor_path.is_none() {
            return Some(filepath.clone());
        }
        self.reference_base
            .as_deref()
            .zip(child.save_location())
            .and_then(|(base, location)| relative_to(&location, base))
            .or_else(|| Some(filepath.clone()))
    }

    fn for_base(&self, base: Option<PathBuf>) -> Self {
        Self {
            reference_base: base,
            ..self.clone()
        }
    }
}

struct SaveAccumulator {
    resolver: FilePathResolver,
    /// Reference directory of every file currently entered, innermost last.
    bases: Vec<PathBuf>,
    done: HashSet<usize>,
    written: HashSet<PathBuf>,
}

fn node_id(node: &dyn Model) -> usize {
    std::ptr::from_ref(node).cast::<()>() as usize
}

/// Saves `root` (and, with `recurse`, every file model below it).
pub(crate) fn save_model(root: &mut dyn Model, options: &SaveOptions) -> VisitResult {
    let settings = options.settings();

    if let Some(filepath) = &options.filepath
        && let Some(file) = root.as_file_mut()
    {
        if filepath.is_relative() {
            file.info_mut().absolute_anchor_path = Some(current_dir());
        }
        file.info_mut().set_filepath(filepath.clone());
    }

    if options.recurse {
        generate_names(root)?;
        return walk_and_update(root, Some(&settings));
    }

    let Some(file) = root.as_file_mut() else {
        return Ok(());
    };
    if file.info().filepath.is_none() {
        let name = file.default_name();
        debug!("Generated file name '{}'", name.display());
        file.info_mut().filepath = Some(name);
    }
    let base = file
        .info()
        .save_location()
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    save_single(file, &settings.for_base(base))
}

/// Recomputes every anchor below `root` without writing anything.
pub(crate) fn synchronize_filepaths(root: &mut dyn Model) -> VisitResult {
    walk_and_update(root, None)
}

fn save_single(file: &mut dyn FileNode, settings: &SaveSettings) -> VisitResult {
    let Some(target) = file.info().save_location() else {
        return Ok(());
    };
    if file.info().state == FileState::Deferred {
        debug!("Skipping deferred model '{}'", target.display());
        return Ok(());
    }
    debug!("Saving '{}'", target.display());
    file.write_file(&target, settings)
        .map_err(|e| e.in_file(&target))?;
    file.info_mut().state = FileState::Saved;
    Ok(())
}

fn generate_names(root: &mut dyn Model) -> VisitResult {
    ModelTreeTraverser::new()
        .with_should_traverse(|node: &dyn Model, _: &()| node.is_intermediate_link())
        .with_should_execute(|node: &dyn Model, _: &()| node.as_file().is_some())
        .with_pre_traverse(|node: &mut dyn Model, _: &mut ()| {
            if let Some(file) = node.as_file_mut()
                && file.info().filepath.is_none()
            {
                let name = file.default_name();
                debug!("Generated file name '{}'", name.display());
                file.info_mut().filepath = Some(name);
            }
            Ok(())
        })
        .traverse(root, ())
        .map(|_| ())
}

/// Walks the file models below `root`, pushing a frame per file the same way a load
/// does, and sets each file's anchor to the directory it resolves against. With
/// `settings`, every file is also written, once per node and once per target path.
fn walk_and_update(root: &mut dyn Model, settings: Option<&SaveSettings>) -> VisitResult {
    let anchor = root
        .as_file()
        .and_then(|file| file.info().absolute_anchor_path.clone())
        .unwrap_or_else(current_dir);

    let mut resolver = FilePathResolver::new();
    resolver.push_new_parent(&anchor, ResolveRelativeMode::ToParent);
    let initial = SaveAccumulator {
        resolver,
        bases: Vec::new(),
        done: HashSet::new(),
        written: HashSet::new(),
    };

    ModelTreeTraverser::new()
        .with_should_traverse(|node: &dyn Model, acc: &SaveAccumulator| {
            node.is_intermediate_link() && !acc.done.contains(&node_id(node))
        })
        .with_should_execute(|node: &dyn Model, _: &SaveAccumulator| node.as_file().is_some())
        .with_pre_traverse(|node: &mut dyn Model, acc: &mut SaveAccumulator| {
            let Some(file) = node.as_file_mut() else {
                return Ok(());
            };
            let parent = file
                .info()
                .filepath
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            acc.resolver
                .push_new_parent(&parent, file.info().relative_mode);
            acc.bases.push(acc.resolver.current_parent());
            Ok(())
        })
        .with_post_traverse(|node: &mut dyn Model, acc: &mut SaveAccumulator| {
            let id = node_id(node);
            acc.resolver.pop_last_parent();
            let Some(file) = node.as_file_mut() else {
                return Ok(());
            };
            let base = acc.bases.pop();
            file.info_mut().absolute_anchor_path = Some(acc.resolver.current_parent());

            if let Some(settings) = settings {
                match file.info().save_location() {
                    Some(target) if acc.written.contains(&target) => {
                        debug!("'{}' already written in this save", target.display());
                        file.info_mut().state = FileState::Saved;
                    }
                    Some(target) => {
                        save_single(file, &settings.for_base(base))?;
                        acc.written.insert(target);
                    }
                    None => {}
                }
            }
            acc.done.insert(id);
            Ok(())
        })
        .traverse(root, initial)
        .map(|_| ())
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

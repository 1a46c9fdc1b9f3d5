// src/core/file_model.rs

//! File-backed models and the load protocol.
//!
//! A [`FileModel`] is a [`Model`] with a disk identity. Loading one goes through a
//! [`FileLoadContext`], which resolves the reference, consults the cache and pushes a
//! parent frame while the file's own references are being loaded. Models referenced from
//! other models are held through [`FileLink`]s so that a file reached along two paths of
//! the tree is one shared instance.

use crate::constants::DEFAULT_FILENAME;
use crate::core::base::{ChildModels, FileModelError, Model, VisitResult, Visitor, VisitorMut};
use crate::core::context::{FileLoadContext, LoadSettings};
use crate::core::paths::{self, ResolveRelativeMode, convert_to_os_style, normalize};
use crate::core::save::{self, SaveOptions, SaveSettings};
use log::debug;
use std::cell::{Ref, RefCell, RefMut};
use std::env;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Lifecycle of a file model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileState {
    /// Built in memory, never loaded or saved.
    #[default]
    New,
    /// A reference that was not followed because the load did not recurse.
    Deferred,
    /// Read from `source_path` and not changed since.
    Loaded,
    /// Changed in memory after it was loaded or saved.
    Modified,
    /// Written to disk by the last save.
    Saved,
}

/// Disk identity of a file model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// The path as referenced (relative or absolute), `None` for in-memory models.
    pub filepath: Option<PathBuf>,
    /// Directory a relative `filepath` is anchored to.
    pub absolute_anchor_path: Option<PathBuf>,
    /// Where the content was loaded from.
    pub source_path: Option<PathBuf>,
    /// How references inside this file are resolved.
    pub relative_mode: ResolveRelativeMode,
    pub state: FileState,
}

impl FileInfo {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: Some(filepath.into()),
            ..Default::default()
        }
    }

    /// The absolute path this model is written to, `None` while it has no path.
    pub fn save_location(&self) -> Option<PathBuf> {
        let filepath = self.filepath.as_ref()?;
        if filepath.is_absolute() {
            return Some(normalize(filepath));
        }
        let anchor = match &self.absolute_anchor_path {
            Some(anchor) => anchor.clone(),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Some(normalize(&anchor.join(filepath)))
    }

    /// Assigns a new path. The model counts as modified from now on.
    pub fn set_filepath(&mut self, filepath: impl Into<PathBuf>) {
        self.filepath = Some(filepath.into());
        self.mark_modified();
    }

    /// Records a mutation. A model without a path stays `New` until it gets one.
    pub fn mark_modified(&mut self) {
        if self.state == FileState::New && self.filepath.is_none() {
            return;
        }
        self.state = FileState::Modified;
    }
}

/// Object-safe view of a file model, used while walking a tree of mixed model types.
pub trait FileNode {
    /// File bookkeeping of the model.
    fn info(&self) -> &FileInfo;
    /// Mutable access to the same bookkeeping.
    fn info_mut(&mut self) -> &mut FileInfo;
    /// `<filename><ext>` of the schema.
    fn default_name(&self) -> PathBuf;
    /// Writes the model itself to `target`, without touching its children.
    fn write_file(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError>;
    /// Short type name, shown in tree listings.
    fn model_type(&self) -> &'static str;
}

impl<M: FileModel> FileNode for M {
    fn info(&self) -> &FileInfo {
        self.file_info()
    }

    fn info_mut(&mut self) -> &mut FileInfo {
        self.file_info_mut()
    }

    fn default_name(&self) -> PathBuf {
        self.generate_name()
    }

    fn write_file(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        self.write(target, settings)
    }

    fn model_type(&self) -> &'static str {
        std::any::type_name::<M>()
    }
}

/// A model backed by its own file on disk.
///
/// Implementors describe how raw content is read (`load_raw`), how it becomes a typed
/// model (`from_raw`) and how the model is written back (`write`). Loading, caching,
/// relative path resolution and saving are provided on top of those.
pub trait FileModel: Model + Default + Sized + 'static {
    /// What [`FileModel::load_raw`] produces, before validation.
    type Raw;

    /// File extension including the dot, e.g. `".ini"`.
    fn ext() -> &'static str;

    /// Default file stem used when a model without a path is saved.
    fn filename() -> &'static str {
        DEFAULT_FILENAME
    }

    fn file_info(&self) -> &FileInfo;
    fn file_info_mut(&mut self) -> &mut FileInfo;

    /// Reads the raw content of `path`.
    fn load_raw(path: &Path) -> Result<Self::Raw, FileModelError>;

    /// Decides how references inside this file resolve. Runs on the raw content because
    /// the frame must be pushed before nested references are loaded.
    fn relative_mode_from_raw(_raw: &Self::Raw) -> ResolveRelativeMode {
        ResolveRelativeMode::ToParent
    }

    /// Builds the model. Nested references are loaded through `context`.
    fn from_raw(raw: Self::Raw, context: &mut FileLoadContext) -> Result<Self, FileModelError>;

    fn post_load(&mut self) {}

    /// Writes this model (not its children) to `target`.
    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError>;

    fn generate_name(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", Self::filename(), Self::ext()))
    }

    /// Loads `path` with default settings.
    fn load(path: impl AsRef<Path>) -> Result<FileLink<Self>, FileModelError> {
        Self::load_with(path, LoadSettings::default())
    }

    /// Loads `path` in a fresh context.
    fn load_with(
        path: impl AsRef<Path>,
        settings: LoadSettings,
    ) -> Result<FileLink<Self>, FileModelError> {
        let mut context = FileLoadContext::new();
        context.initialize_load_settings(settings);
        context.load::<Self>(path.as_ref())
    }

    fn save(&mut self, options: &SaveOptions) -> Result<(), FileModelError> {
        save::save_model(self, options)
    }

    /// Recomputes the anchors of every file below this one from the current paths.
    fn synchronize_filepaths(&mut self) -> Result<(), FileModelError> {
        save::synchronize_filepaths(self)
    }
}

/// Shared handle to a file model referenced from another model.
///
/// Clones point to the same instance. Mutable access marks the model modified.
pub struct FileLink<M>(Rc<RefCell<M>>);

impl<M> Clone for FileLink<M> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<M: fmt::Debug> fmt::Debug for FileLink<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(model) => f.debug_tuple("FileLink").field(&*model).finish(),
            Err(_) => f.write_str("FileLink(<borrowed>)"),
        }
    }
}

impl<M: FileModel> Default for FileLink<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: PartialEq> PartialEq for FileLink<M> {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.0.try_borrow(), other.0.try_borrow()) {
            (Ok(left), Ok(right)) => *left == *right,
            _ => false,
        }
    }
}

impl<M: FileModel> FileLink<M> {
    pub fn new(model: M) -> Self {
        Self(Rc::new(RefCell::new(model)))
    }

    pub(crate) fn from_shared(shared: Rc<RefCell<M>>) -> Self {
        Self(shared)
    }

    pub(crate) fn shared(&self) -> Rc<RefCell<M>> {
        Rc::clone(&self.0)
    }

    pub fn borrow(&self) -> Ref<'_, M> {
        self.0.borrow()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, M>, FileModelError> {
        self.0.try_borrow().map_err(|_| borrowed::<M>())
    }

    /// Mutable access. Marks the model as modified.
    pub fn borrow_mut(&self) -> RefMut<'_, M> {
        let mut model = self.0.borrow_mut();
        model.file_info_mut().mark_modified();
        model
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, M>, FileModelError> {
        let mut model = self.0.try_borrow_mut().map_err(|_| borrowed::<M>())?;
        model.file_info_mut().mark_modified();
        Ok(model)
    }

    /// True if both links share the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The referenced path, `None` if unset or if the model is mutably borrowed.
    pub fn filepath(&self) -> Option<PathBuf> {
        self.0
            .try_borrow()
            .ok()
            .and_then(|model| model.file_info().filepath.clone())
    }

    /// Unwraps the model if this is the last handle to it.
    pub fn into_inner(self) -> Result<M, Self> {
        Rc::try_unwrap(self.0)
            .map(RefCell::into_inner)
            .map_err(Self)
    }
}

fn borrowed<M>() -> FileModelError {
    FileModelError::Borrowed {
        what: std::any::type_name::<M>().to_string(),
    }
}

impl<M: FileModel> ChildModels for FileLink<M> {
    fn visit(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        let model = self.0.try_borrow().map_err(|_| borrowed::<M>())?;
        visitor(&*model)
    }

    fn visit_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        // Bookkeeping walks must not flag the model as modified.
        let mut model = self.0.try_borrow_mut().map_err(|_| borrowed::<M>())?;
        visitor(&mut *model)
    }
}

/// Loads the model at `path` within `context`.
///
/// A path already loaded in this context, with unchanged content, returns the cached
/// instance. The context is torn down when the outermost call returns, also on failure.
pub(crate) fn load_model<M: FileModel>(
    context: &mut FileLoadContext,
    path: &Path,
) -> Result<FileLink<M>, FileModelError> {
    let outermost = context.enter();
    let mut context = scopeguard::guard(context, |context| context.exit());

    if outermost && context.load_settings_opt().is_none() {
        context.initialize_load_settings(LoadSettings::default());
    }
    let settings = context.load_settings();

    let reference = convert_to_os_style(&path.to_string_lossy(), settings.path_style);
    let anchor = context.current_parent();
    let mut resolved = context.resolve(&reference);
    let mut filepath = reference.clone();

    if settings.resolve_casing {
        let repaired = paths::resolve_casing(&resolved);
        if repaired != resolved {
            filepath = recase_reference(&reference, &repaired);
            resolved = repaired;
        }
    }

    if !outermost && !settings.recurse {
        debug!("Not following reference '{}'", reference.display());
        let mut model = M::default();
        *model.file_info_mut() = FileInfo {
            filepath: Some(filepath),
            absolute_anchor_path: Some(anchor),
            source_path: Some(resolved),
            relative_mode: ResolveRelativeMode::default(),
            state: FileState::Deferred,
        };
        return Ok(FileLink::new(model));
    }

    if let Some(cached) = context.retrieve_model::<RefCell<M>>(&resolved) {
        if !context.has_changed(&resolved) {
            debug!("Reusing cached model for '{}'", resolved.display());
            return Ok(FileLink::from_shared(cached));
        }
        debug!("'{}' changed on disk, reloading", resolved.display());
    }

    if !resolved.is_file() {
        return Err(FileModelError::NotFound { path: resolved });
    }

    if !context.begin_loading(&resolved) {
        return Err(FileModelError::CyclicReference { path: resolved });
    }
    debug!("Loading '{}'", resolved.display());
    let built = build_model::<M>(&mut context, &resolved);
    context.finish_loading(&resolved);
    let (mut model, mode) = built?;

    *model.file_info_mut() = FileInfo {
        filepath: Some(filepath),
        absolute_anchor_path: Some(anchor),
        source_path: Some(resolved.clone()),
        relative_mode: mode,
        state: FileState::Loaded,
    };
    let link = FileLink::new(model);
    context.register_model(&resolved, link.shared());
    link.0.borrow_mut().post_load();
    Ok(link)
}

/// Reads and validates `resolved`, with its own parent frame pushed while nested
/// references are loaded.
fn build_model<M: FileModel>(
    context: &mut FileLoadContext,
    resolved: &Path,
) -> Result<(M, ResolveRelativeMode), FileModelError> {
    let raw = M::load_raw(resolved).map_err(|e| e.in_file(resolved))?;
    let mode = M::relative_mode_from_raw(&raw);

    let parent = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
    context.push_new_parent(&parent, mode);
    let built = M::from_raw(raw, context);
    context.pop_last_parent();
    let model = built.map_err(|e| e.in_file(resolved))?;
    Ok((model, mode))
}

/// Applies the on-disk casing of `repaired` to `reference`. References that climb out of
/// their directory (`..`) keep their original spelling.
fn recase_reference(reference: &Path, repaired: &Path) -> PathBuf {
    if reference.is_absolute() {
        return repaired.to_path_buf();
    }
    if reference
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return reference.to_path_buf();
    }
    let kept = reference
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count();
    let tail: Vec<_> = repaired.components().collect();
    tail.iter()
        .skip(tail.len().saturating_sub(kept))
        .map(|component| component.as_os_str())
        .collect()
}

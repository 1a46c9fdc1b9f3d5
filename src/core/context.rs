// src/core/context.rs

//! The state shared by one top-level load call and every nested load below it.

use crate::core::base::FileModelError;
use crate::core::cache::FileModelCache;
use crate::core::file_model::{FileLink, FileModel, load_model};
use crate::core::paths::{FilePathResolver, PathStyle, ResolveRelativeMode};
use crate::ini::section::UnknownKeywordErrorManager;
use log::debug;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Load-time flags, fixed for the whole duration of a top-level load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Follow nested file references. When off, references become deferred placeholders.
    pub recurse: bool,
    /// Repair path casing against the filesystem.
    pub resolve_casing: bool,
    /// Separator convention used by references inside the files.
    pub path_style: PathStyle,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            recurse: true,
            resolve_casing: false,
            path_style: PathStyle::current(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Inactive,
    Active,
}

/// Cache, parent-frame stack and settings of one top-level load.
///
/// Nested loads reuse the active context. When the outermost load returns, successfully
/// or not, the cache and frames are dropped and the context is inactive again.
#[derive(Debug, Default)]
pub struct FileLoadContext {
    settings: Option<LoadSettings>,
    resolver: FilePathResolver,
    cache: FileModelCache,
    active_calls: usize,
    /// Resolved paths whose load has started but not finished.
    in_progress: HashSet<PathBuf>,
    unknown_keywords: UnknownKeywordErrorManager,
}

impl FileLoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ContextState {
        if self.settings.is_some() {
            ContextState::Active
        } else {
            ContextState::Inactive
        }
    }

    /// Sets the load settings. While a context is active its settings are inherited and
    /// `settings` is ignored.
    pub fn initialize_load_settings(&mut self, settings: LoadSettings) {
        if let Some(active) = &self.settings {
            debug!("Load context already active, inheriting settings {:?}", active);
            return;
        }
        self.settings = Some(settings);
    }

    /// The active settings, or the defaults when inactive.
    pub fn load_settings(&self) -> LoadSettings {
        self.settings.unwrap_or_default()
    }

    pub(crate) fn load_settings_opt(&self) -> Option<LoadSettings> {
        self.settings
    }

    /// Loads `path` as `M`, reusing this context when it is already active.
    pub fn load<M: FileModel>(&mut self, path: &Path) -> Result<FileLink<M>, FileModelError> {
        load_model(self, path)
    }

    pub fn current_parent(&self) -> PathBuf {
        self.resolver.current_parent()
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.resolver.resolve(path)
    }

    pub fn push_new_parent(&mut self, parent: &Path, mode: ResolveRelativeMode) {
        self.resolver.push_new_parent(parent, mode);
    }

    pub fn pop_last_parent(&mut self) {
        self.resolver.pop_last_parent();
    }

    pub fn depth(&self) -> usize {
        self.resolver.depth()
    }

    pub fn cache_is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn retrieve_model<T: Any>(&self, path: &Path) -> Option<Rc<T>> {
        self.cache.retrieve_model(path)
    }

    pub fn register_model<T: Any>(&mut self, path: &Path, model: Rc<T>) {
        self.cache.register_model(path, model);
    }

    pub fn has_changed(&self, path: &Path) -> bool {
        self.cache.has_changed(path)
    }

    /// Marks `path` as being loaded. Returns false if it already is, which means the
    /// file references itself through its descendants.
    pub(crate) fn begin_loading(&mut self, path: &Path) -> bool {
        self.in_progress.insert(path.to_path_buf())
    }

    pub(crate) fn finish_loading(&mut self, path: &Path) {
        self.in_progress.remove(path);
    }

    /// Keywords ignored under a lenient policy during the last top-level load.
    pub fn unknown_keywords(&self) -> &UnknownKeywordErrorManager {
        &self.unknown_keywords
    }

    pub fn unknown_keywords_mut(&mut self) -> &mut UnknownKeywordErrorManager {
        &mut self.unknown_keywords
    }

    /// Enters a load call. Returns true for the outermost call.
    pub(crate) fn enter(&mut self) -> bool {
        let outermost = self.active_calls == 0;
        if outermost {
            self.unknown_keywords.clear();
        }
        self.active_calls += 1;
        outermost
    }

    /// Leaves a load call, tearing the context down after the outermost one.
    pub(crate) fn exit(&mut self) {
        self.active_calls = self.active_calls.saturating_sub(1);
        if self.active_calls == 0 {
            if !self.resolver.is_empty() {
                log::warn!(
                    "Load finished with {} parent frames left, discarding them.",
                    self.resolver.depth()
                );
            }
            debug!("Tearing down load context ({} cached models)", self.cache.len());
            self.cache.clear();
            self.in_progress.clear();
            self.resolver = FilePathResolver::new();
            self.settings = None;
        }
    }
}

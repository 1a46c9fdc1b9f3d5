// src/core/paths.rs

//! Path resolution for file references.
//!
//! Relative references inside a model file are resolved against a stack of parent
//! directories, one frame per file currently being loaded or saved. This module also
//! repairs case mismatches against the real filesystem and converts references between
//! Windows and POSIX notation.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    // `C:\dir\file` or `c:/dir/file`
    static ref WINDOWS_DRIVE_RE: Regex = Regex::new(r"^([A-Za-z]):(?:[\\/]|$)(.*)$").unwrap();
    // `/c/dir/file` (the POSIX rendering of a drive letter)
    static ref POSIX_DRIVE_RE: Regex = Regex::new(r"^/([A-Za-z])(?:/|$)(.*)$").unwrap();
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Unknown path style '{0}'. Expected 'unix' or 'windows'.")]
    UnknownPathStyle(String),
}

/// How relative references inside a file are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolveRelativeMode {
    /// Relative to the directory of the file that contains the reference.
    #[default]
    ToParent,
    /// Relative to the directory of the anchor file, regardless of nesting depth.
    ToAnchor,
}

/// The separator convention used by references written inside files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStyle {
    #[serde(rename = "unix")]
    UnixLike,
    #[serde(rename = "windows")]
    WindowsLike,
}

impl PathStyle {
    /// The style of the operating system this binary runs on.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::WindowsLike
        } else {
            Self::UnixLike
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::current()
    }
}

impl FromStr for PathStyle {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" | "unixlike" | "posix" => Ok(Self::UnixLike),
            "windows" | "windowslike" => Ok(Self::WindowsLike),
            other => Err(PathError::UnknownPathStyle(other.to_string())),
        }
    }
}

impl fmt::Display for PathStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnixLike => write!(f, "unix"),
            Self::WindowsLike => write!(f, "windows"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolveFrame {
    directory: PathBuf,
    mode: ResolveRelativeMode,
}

/// A LIFO stack of parent directories used to resolve relative references.
///
/// The outermost frame pushed with [`ResolveRelativeMode::ToAnchor`] wins: every
/// reference below it resolves against that frame's directory. Without such a frame the
/// innermost (direct parent) frame is used, and with no frames at all the current working
/// directory.
#[derive(Debug, Clone, Default)]
pub struct FilePathResolver {
    frames: Vec<ResolveFrame>,
}

impl FilePathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the directory relative references currently resolve against.
    pub fn current_parent(&self) -> PathBuf {
        if let Some(anchor) = self
            .frames
            .iter()
            .find(|frame| frame.mode == ResolveRelativeMode::ToAnchor)
        {
            return anchor.directory.clone();
        }
        match self.frames.last() {
            Some(frame) => frame.directory.clone(),
            None => current_dir(),
        }
    }

    /// Resolves `path` against the current parent. Absolute paths are only normalized.
    /// Never touches the filesystem, so missing files are not an error here.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.current_parent().join(path))
        }
    }

    /// Pushes a new frame. `parent` may be relative, in which case it is resolved first.
    pub fn push_new_parent(&mut self, parent: &Path, mode: ResolveRelativeMode) {
        let directory = self.resolve(parent);
        log::trace!(
            "Pushing parent frame '{}' ({:?}), depth {}",
            directory.display(),
            mode,
            self.frames.len() + 1
        );
        self.frames.push(ResolveFrame { directory, mode });
    }

    /// Pops the innermost frame. Popping an empty stack is a no-op.
    pub fn pop_last_parent(&mut self) {
        if self.frames.pop().is_none() {
            log::warn!("Attempted to pop a parent frame from an empty resolver stack.");
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Lexically removes `.` and resolves `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Spells `path` relative to the directory `base`, climbing out with `..` as needed.
///
/// Both paths must be absolute. Returns `None` when they do not share a root (different
/// drives) or when `path` is `base` itself.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || !base.is_absolute() {
        return None;
    }
    let path = normalize(path);
    let base = normalize(base);
    let target: Vec<Component<'_>> = path.components().collect();
    let from: Vec<Component<'_>> = base.components().collect();

    if target.first() != from.first() {
        return None;
    }
    let common = target
        .iter()
        .zip(&from)
        .take_while(|(left, right)| left == right)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in target.iter().skip(common) {
        relative.push(component.as_os_str());
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Substitutes the on-disk casing for every segment of `path` that exists.
///
/// Segments are matched exactly first and case-insensitively second. As soon as a
/// segment cannot be found the remainder is appended unchanged, so a path that does
/// not exist comes back as given and the not-found error surfaces when it is opened.
pub fn resolve_casing(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    let mut components = path.components();

    while let Some(component) = components.next() {
        let name = match component {
            Component::Normal(name) => name,
            other => {
                resolved.push(other.as_os_str());
                continue;
            }
        };

        match find_entry_casing(&resolved, name.to_str()) {
            Some(on_disk) => resolved.push(on_disk),
            None => {
                resolved.push(name);
                resolved.extend(components);
                break;
            }
        }
    }

    if resolved != path {
        log::debug!(
            "Resolved casing of '{}' to '{}'",
            path.display(),
            resolved.display()
        );
    }
    resolved
}

fn find_entry_casing(directory: &Path, name: Option<&str>) -> Option<String> {
    let name = name?;
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };
    let entries = fs::read_dir(directory).ok()?;

    let wanted = name.to_lowercase();
    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|entry_name| entry_name.to_lowercase() == wanted)
        .collect();

    if candidates.iter().any(|candidate| candidate == name) {
        return Some(name.to_string());
    }
    // Several case variants of one name can coexist on case-sensitive systems.
    candidates.sort();
    candidates.into_iter().next()
}

/// Rewrites separators and drive notation between path styles. Segment casing is kept.
pub fn convert_path_style(path: &str, source: PathStyle, target: PathStyle) -> String {
    match (source, target) {
        (PathStyle::WindowsLike, PathStyle::UnixLike) => windows_to_posix(path),
        (PathStyle::UnixLike, PathStyle::WindowsLike) => posix_to_windows(path),
        _ => path.to_string(),
    }
}

/// Converts a reference written in `source` style into a path for this operating system.
pub fn convert_to_os_style(path: &str, source: PathStyle) -> PathBuf {
    PathBuf::from(convert_path_style(path, source, PathStyle::current()))
}

/// Renders a path of this operating system as a reference in `target` style.
pub fn convert_from_os_style(path: &Path, target: PathStyle) -> String {
    convert_path_style(&path.to_string_lossy(), PathStyle::current(), target)
}

fn windows_to_posix(path: &str) -> String {
    if let Some(caps) = WINDOWS_DRIVE_RE.captures(path) {
        let drive = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str()).replace('\\', "/");
        if rest.is_empty() {
            return format!("/{}", drive);
        }
        return format!("/{}/{}", drive, rest);
    }
    path.replace('\\', "/")
}

fn posix_to_windows(path: &str) -> String {
    if let Some(caps) = POSIX_DRIVE_RE.captures(path) {
        let drive = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str()).replace('/', "\\");
        return format!("{}:\\{}", drive, rest);
    }
    path.replace('/', "\\")
}

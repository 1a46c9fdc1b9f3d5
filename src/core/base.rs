// src/core/base.rs

//! The common supertype of every node in a model tree.
//!
//! A tree is made of [`Model`] values. Each model declares its own child models
//! explicitly through [`Model::visit_children`] / [`Model::visit_children_mut`], in field
//! declaration order. File-backed models additionally expose a [`FileNode`] view.

use crate::core::file_model::FileNode;
use crate::core::graph_display;
use crate::ini::parser::ParseError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileModelError {
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("Invalid value for '{key}' in section [{section}]: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
    #[error("Missing required field '{key}' in section [{section}]")]
    MissingField { section: String, key: String },
    #[error("Missing required section [{section}]")]
    MissingSection { section: String },
    #[error("Unknown keywords in section [{section}]: {}", keywords.join(", "))]
    UnknownKeywords {
        section: String,
        keywords: Vec<String>,
    },
    #[error("Unrecognized type '{value}' in section [{section}]")]
    UnrecognizedVariant { section: String, value: String },
    #[error("'{path}' references itself through its own descendants")]
    CyclicReference { path: PathBuf },
    #[error("Model '{what}' is already borrowed elsewhere in the tree")]
    Borrowed { what: String },
    #[error("In file '{path}': {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<FileModelError>,
    },
}

impl FileModelError {
    /// Wraps the error with the file it occurred in. Errors that already name a file
    /// (not found, I/O, parse, or an outer wrapper) are returned unchanged.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Self::NotFound { .. } | Self::Io { .. } | Self::Parse { .. } | Self::InFile { .. } => {
                self
            }
            other => Self::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub type VisitResult = Result<(), FileModelError>;

/// Callback handed each direct child of a model.
pub type Visitor<'v> = dyn FnMut(&dyn Model) -> VisitResult + 'v;

/// Mutable counterpart of [`Visitor`].
pub type VisitorMut<'v> = dyn FnMut(&mut dyn Model) -> VisitResult + 'v;

pub trait Model {
    /// Calls `visitor` once per direct child model, in field declaration order.
    fn visit_children(&self, _visitor: &mut Visitor<'_>) -> VisitResult {
        Ok(())
    }

    /// Calls `visitor` once per direct child model, in field declaration order.
    /// Must visit exactly the children [`Model::visit_children`] visits.
    fn visit_children_mut(&mut self, _visitor: &mut VisitorMut<'_>) -> VisitResult {
        Ok(())
    }

    /// The file view of this node, `None` for plain (non-file) models.
    fn as_file(&self) -> Option<&dyn FileNode> {
        None
    }

    fn as_file_mut(&mut self) -> Option<&mut dyn FileNode> {
        None
    }

    /// True if this node is a file model with a path set.
    fn is_file_link(&self) -> bool {
        self.as_file()
            .is_some_and(|file| file.info().filepath.is_some())
    }

    /// True if descending into this node can reach file models: the node is a file model
    /// itself (its content may hold further references), or one of its children is an
    /// intermediate link. Recursive save and name generation only descend through these.
    fn is_intermediate_link(&self) -> bool {
        if self.as_file().is_some() {
            return true;
        }
        let mut found = false;
        let visited = self.visit_children(&mut |child: &dyn Model| {
            found = found || child.is_intermediate_link();
            Ok(())
        });
        visited.is_ok() && found
    }

    /// Renders the file links below this node as an indented tree.
    fn show_tree(&self, indent: usize) -> String
    where
        Self: Sized,
    {
        graph_display::show_tree(self, indent)
    }
}

/// Implements the [`Model`] file accessors for a type that implements `FileModel`.
#[macro_export]
macro_rules! file_node_accessors {
    () => {
        fn as_file(&self) -> Option<&dyn $crate::core::file_model::FileNode> {
            Some(self)
        }

        fn as_file_mut(&mut self) -> Option<&mut dyn $crate::core::file_model::FileNode> {
            Some(self)
        }
    };
}

/// A field that holds zero or more child models.
///
/// Implemented for file links and for `Option`/`Vec` of anything that implements it.
/// Plain nested models are handed to the visitor directly.
pub trait ChildModels {
    fn visit(&self, visitor: &mut Visitor<'_>) -> VisitResult;
    fn visit_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult;
}

impl<T: ChildModels> ChildModels for Option<T> {
    fn visit(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        match self {
            Some(child) => child.visit(visitor),
            None => Ok(()),
        }
    }

    fn visit_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        match self {
            Some(child) => child.visit_mut(visitor),
            None => Ok(()),
        }
    }
}

impl<T: ChildModels> ChildModels for Vec<T> {
    fn visit(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        self.iter().try_for_each(|child| child.visit(visitor))
    }

    fn visit_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        self.iter_mut().try_for_each(|child| child.visit_mut(visitor))
    }
}

/// Applies `function` to every model below `node` and then to `node` itself
/// (children first, in declaration order) and returns the result for `node`.
/// The first error aborts the walk.
pub fn apply_recurse<R>(
    node: &mut dyn Model,
    function: &mut dyn FnMut(&mut dyn Model) -> Result<R, FileModelError>,
) -> Result<R, FileModelError> {
    node.visit_children_mut(&mut |child: &mut dyn Model| {
        apply_recurse(child, &mut *function).map(|_| ())
    })?;
    function(node)
}

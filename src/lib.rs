//! Structured, validated read/write access to the INI-like input files of
//! hydrodynamic simulation suites.
//!
//! A model tree is loaded from a root file, following file references into nested
//! file models that share one instance per resolved path. Saving writes the tree back,
//! optionally recursively and in a chosen path style.

pub mod cli;
pub mod constants;
pub mod core;
pub mod ini;
pub mod settings;

pub use crate::core::base::{FileModelError, Model};
pub use crate::core::file_model::{FileLink, FileModel};
pub use crate::core::parsable::IniFileModel;

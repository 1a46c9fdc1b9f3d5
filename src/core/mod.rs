// src/core/mod.rs

//! The file-model framework: paths, caching, load context, model base and save protocol.

pub mod base;
pub mod cache;
pub mod context;
pub mod disk_only;
pub mod file_model;
pub mod graph_display;
pub mod parsable;
pub mod paths;
pub mod save;
pub mod traverser;

#[cfg(test)]
pub(crate) mod test_models;

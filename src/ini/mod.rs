// src/ini/mod.rs

//! Generic reading and writing of INI-like files.

pub mod models;
pub mod parser;
pub mod section;
pub mod serializer;
pub mod values;

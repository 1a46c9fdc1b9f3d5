// src/core/parsable.rs

//! File models with textual content, parsed and rendered by pluggable strategies.

use crate::core::base::{FileModelError, Model};
use crate::core::context::FileLoadContext;
use crate::core::file_model::{FileInfo, FileModel};
use crate::core::save::SaveSettings;
use crate::file_node_accessors;
use crate::ini::models::Document;
use crate::ini::parser::IniParser;
use crate::ini::serializer::IniSerializer;
use log::debug;
use std::fs;
use std::path::Path;

/// Turns a file into structured raw data.
pub trait Parser {
    type Output;

    fn parse(&self, path: &Path) -> Result<Self::Output, FileModelError>;
}

/// Renders structured data as text.
pub trait Serializer {
    type Input;

    fn serialize(&self, input: &Self::Input) -> String;
}

impl Parser for IniParser {
    type Output = Document;

    fn parse(&self, path: &Path) -> Result<Document, FileModelError> {
        let text = fs::read_to_string(path).map_err(|e| FileModelError::io(path, e))?;
        self.parse_str(&text)
            .map_err(|source| FileModelError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Serializer for IniSerializer {
    type Input = Document;

    fn serialize(&self, input: &Document) -> String {
        IniSerializer::serialize(self, input)
    }
}

/// A file model whose content is read by a [`Parser`] and written by a [`Serializer`].
///
/// Implementors typically use `parse_file` as their `load_raw` and `write_serialized`
/// as their `write`.
pub trait ParsableFileModel: FileModel {
    type Parser: Parser;
    type Serializer: Serializer;

    fn parser() -> Self::Parser;

    /// The serializer for one save, configured from `settings`.
    fn serializer(settings: &SaveSettings) -> Self::Serializer;

    /// Converts this model into what its serializer renders. File references are
    /// spelled through `settings`.
    fn to_raw(
        &self,
        settings: &SaveSettings,
    ) -> Result<<Self::Serializer as Serializer>::Input, FileModelError>;

    /// Renders this model as text without touching the disk.
    fn serialize(&self, settings: &SaveSettings) -> Result<String, FileModelError> {
        let raw = self.to_raw(settings)?;
        Ok(Self::serializer(settings).serialize(&raw))
    }

    fn parse_file(path: &Path) -> Result<<Self::Parser as Parser>::Output, FileModelError> {
        Self::parser().parse(path)
    }

    fn write_serialized(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        let text = self.serialize(settings)?;
        write_text(target, &text)
    }
}

/// Writes `text` to `target`, creating missing parent directories.
pub fn write_text(target: &Path, text: &str) -> Result<(), FileModelError> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| FileModelError::io(parent, e))?;
    }
    debug!("Writing {} bytes to '{}'", text.len(), target.display());
    fs::write(target, text).map_err(|e| FileModelError::io(target, e))
}

/// An untyped INI file, kept as the parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IniFileModel {
    #[serde(skip)]
    pub file: FileInfo,
    #[serde(flatten)]
    pub document: Document,
}

impl Model for IniFileModel {
    file_node_accessors!();
}

impl FileModel for IniFileModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".ini"
    }

    fn file_info(&self) -> &FileInfo {
        &self.file
    }

    fn file_info_mut(&mut self) -> &mut FileInfo {
        &mut self.file
    }

    fn load_raw(path: &Path) -> Result<Document, FileModelError> {
        Self::parse_file(path)
    }

    fn from_raw(document: Document, _context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        Ok(Self {
            file: FileInfo::default(),
            document,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        self.write_serialized(target, settings)
    }
}

impl ParsableFileModel for IniFileModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, _settings: &SaveSettings) -> Result<Document, FileModelError> {
        Ok(self.document.clone())
    }
}

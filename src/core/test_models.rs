// src/core/test_models.rs

//! Small concrete schemas used to exercise the load/save protocol in tests.

use crate::core::base::{ChildModels, FileModelError, Model, VisitResult, Visitor, VisitorMut};
use crate::core::context::FileLoadContext;
use crate::core::disk_only::DiskOnlyFileModel;
use crate::core::file_model::{FileInfo, FileLink, FileModel};
use crate::core::parsable::ParsableFileModel;
use crate::core::paths::ResolveRelativeMode;
use crate::core::save::SaveSettings;
use crate::file_node_accessors;
use crate::ini::models::{Document, Section};
use crate::ini::parser::IniParser;
use crate::ini::serializer::IniSerializer;
use crate::ini::section::{SectionReader, SectionWriter, UnknownKeywordPolicy, require_section};
use crate::ini::values::IniValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

thread_local! {
    static WRITES: RefCell<Vec<PathBuf>> = const { RefCell::new(Vec::new()) };
}

/// Returns and clears the targets written by test models on this thread.
pub(crate) fn take_writes() -> Vec<PathBuf> {
    WRITES.with(|writes| writes.take())
}

fn record_write(target: &Path) {
    WRITES.with(|writes| writes.borrow_mut().push(target.to_path_buf()));
}

pub(crate) fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn load_optional<M: FileModel>(
    context: &mut FileLoadContext,
    path: Option<PathBuf>,
) -> Result<Option<FileLink<M>>, FileModelError> {
    path.map(|path| context.load::<M>(&path)).transpose()
}

// ---- child.ini ----

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChildModel {
    pub(crate) file: FileInfo,
    pub(crate) file_version: String,
    pub(crate) values: Vec<f64>,
}

impl Model for ChildModel {
    file_node_accessors!();
}

impl FileModel for ChildModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".ini"
    }

    fn filename() -> &'static str {
        "child"
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

    fn from_raw(document: Document, context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        let mut general = SectionReader::new(require_section(&document, "General")?);
        let file_version = general.required(&["fileVersion"])?;
        general.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Error)?;

        let values = match document.section("Data") {
            Some(section) => {
                let mut data = SectionReader::new(section);
                let values = data.vector(&["value"])?;
                data.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Error)?;
                values
            }
            None => Vec::new(),
        };

        Ok(Self {
            file: FileInfo::default(),
            file_version,
            values,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        record_write(target);
        self.write_serialized(target, settings)
    }
}

impl ParsableFileModel for ChildModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, settings: &SaveSettings) -> Result<Document, FileModelError> {
        let mut general = SectionWriter::new("General", settings);
        general.value("fileVersion", &self.file_version);
        let mut data = SectionWriter::new("Data", settings);
        data.vector("value", &self.values);

        let document = Document {
            header_comment: Vec::new(),
            sections: vec![general.finish(), data.finish()],
        };
        Ok(document)
    }
}

// ---- mid.mid ----

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MidModel {
    pub(crate) file: FileInfo,
    pub(crate) child_file: Option<FileLink<ChildModel>>,
}

impl Model for MidModel {
    fn visit_children(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        self.child_file.visit(visitor)
    }

    fn visit_children_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        self.child_file.visit_mut(visitor)
    }

    file_node_accessors!();
}

impl FileModel for MidModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".mid"
    }

    fn filename() -> &'static str {
        "mid"
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

    fn from_raw(document: Document, context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        let mut files = SectionReader::new(require_section(&document, "Files")?);
        let child_path = files.optional(&["childFile"])?;
        files.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Error)?;

        Ok(Self {
            file: FileInfo::default(),
            child_file: load_optional(context, child_path)?,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        record_write(target);
        self.write_serialized(target, settings)
    }
}

impl ParsableFileModel for MidModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, settings: &SaveSettings) -> Result<Document, FileModelError> {
        let mut files = SectionWriter::new("Files", settings);
        files.file_link("childFile", self.child_file.as_ref());
        let document = Document {
            header_comment: Vec::new(),
            sections: vec![files.finish()],
        };
        Ok(document)
    }
}

// ---- root.root ----

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct General {
    pub(crate) file_version: Option<String>,
    pub(crate) paths_relative_to_parent: Option<bool>,
}

impl Model for General {}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FilesSection {
    pub(crate) child_file: Option<FileLink<ChildModel>>,
    pub(crate) grid_file: Option<FileLink<DiskOnlyFileModel>>,
    pub(crate) mid_file: Option<FileLink<MidModel>>,
    pub(crate) extra_files: Vec<FileLink<ChildModel>>,
}

impl Model for FilesSection {
    fn visit_children(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        self.child_file.visit(visitor)?;
        self.grid_file.visit(visitor)?;
        self.mid_file.visit(visitor)?;
        self.extra_files.visit(visitor)
    }

    fn visit_children_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        self.child_file.visit_mut(visitor)?;
        self.grid_file.visit_mut(visitor)?;
        self.mid_file.visit_mut(visitor)?;
        self.extra_files.visit_mut(visitor)
    }
}

/// Root schema. Unknown keywords are only warned about, and `pathsRelativeToParent`
/// selects how nested references resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RootModel {
    pub(crate) file: FileInfo,
    pub(crate) general: General,
    pub(crate) files: FilesSection,
}

impl RootModel {
    pub(crate) fn with_children(names: &[&str]) -> Self {
        let mut root = Self::default();
        root.files.extra_files = names
            .iter()
            .map(|name| {
                FileLink::new(ChildModel {
                    file: FileInfo::new(*name),
                    ..Default::default()
                })
            })
            .collect();
        root
    }
}

impl Model for RootModel {
    fn visit_children(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        visitor(&self.general)?;
        visitor(&self.files)
    }

    fn visit_children_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        visitor(&mut self.general)?;
        visitor(&mut self.files)
    }

    file_node_accessors!();
}

impl FileModel for RootModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".root"
    }

    fn filename() -> &'static str {
        "root"
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

    /// Missing or unreadable `pathsRelativeToParent` means anchor-relative.
    fn relative_mode_from_raw(document: &Document) -> ResolveRelativeMode {
        let flag = document
            .section("General")
            .and_then(|section| section.value("pathsRelativeToParent"))
            .and_then(|raw| bool::from_ini(raw).ok());
        match flag {
            Some(true) => ResolveRelativeMode::ToParent,
            Some(false) | None => ResolveRelativeMode::ToAnchor,
        }
    }

    fn from_raw(document: Document, context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        let general = match document.section("General") {
            Some(section) => {
                let mut reader = SectionReader::new(section);
                let general = General {
                    file_version: reader.optional(&["fileVersion"])?,
                    paths_relative_to_parent: reader.optional(&["pathsRelativeToParent"])?,
                };
                reader.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Warn)?;
                general
            }
            None => General::default(),
        };

        let files = match document.section("Files") {
            Some(section) => read_files_section(section, context)?,
            None => FilesSection::default(),
        };

        Ok(Self {
            file: FileInfo::default(),
            general,
            files,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        record_write(target);
        self.write_serialized(target, settings)
    }
}

fn read_files_section(
    section: &Section,
    context: &mut FileLoadContext,
) -> Result<FilesSection, FileModelError> {
    let mut reader = SectionReader::new(section);
    let child_path = reader.optional(&["childFile"])?;
    let grid_path = reader.optional(&["gridFile", "netFile"])?;
    let mid_path = reader.optional(&["midFile"])?;
    let extra_paths: Vec<PathBuf> = reader.list(&["extraFiles"], ";")?;
    reader.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Warn)?;

    Ok(FilesSection {
        child_file: load_optional(context, child_path)?,
        grid_file: load_optional(context, grid_path)?,
        mid_file: load_optional(context, mid_path)?,
        extra_files: extra_paths
            .iter()
            .map(|path| context.load::<ChildModel>(path))
            .collect::<Result<_, _>>()?,
    })
}

impl ParsableFileModel for RootModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, settings: &SaveSettings) -> Result<Document, FileModelError> {
        let mut general = SectionWriter::new("General", settings);
        general
            .optional("fileVersion", self.general.file_version.as_ref())
            .optional(
                "pathsRelativeToParent",
                self.general.paths_relative_to_parent.as_ref(),
            );

        let mut files = SectionWriter::new("Files", settings);
        files
            .file_link("childFile", self.files.child_file.as_ref())
            .file_link("gridFile", self.files.grid_file.as_ref())
            .file_link("midFile", self.files.mid_file.as_ref())
            .file_links("extraFiles", &self.files.extra_files, ";");

        let document = Document {
            header_comment: vec!["Root model".to_string()],
            sections: vec![general.finish(), files.finish()],
        };
        Ok(document)
    }
}

// ---- chain.loop ----

/// A file that may reference another file of its own kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LoopModel {
    pub(crate) file: FileInfo,
    pub(crate) next: Option<FileLink<LoopModel>>,
}

impl Model for LoopModel {
    fn visit_children(&self, visitor: &mut Visitor<'_>) -> VisitResult {
        self.next.visit(visitor)
    }

    fn visit_children_mut(&mut self, visitor: &mut VisitorMut<'_>) -> VisitResult {
        self.next.visit_mut(visitor)
    }

    file_node_accessors!();
}

impl FileModel for LoopModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".loop"
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

    fn from_raw(document: Document, context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        let mut files = SectionReader::new(require_section(&document, "Files")?);
        let next_path = files.optional(&["next"])?;
        files.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Error)?;

        Ok(Self {
            file: FileInfo::default(),
            next: load_optional(context, next_path)?,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        self.write_serialized(target, settings)
    }
}

impl ParsableFileModel for LoopModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, settings: &SaveSettings) -> Result<Document, FileModelError> {
        let mut files = SectionWriter::new("Files", settings);
        files.file_link("next", self.next.as_ref());
        Ok(Document {
            header_comment: Vec::new(),
            sections: vec![files.finish()],
        })
    }
}

// ---- structures.str ----

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Structure {
    Weir { id: String, crest_level: f64 },
    Pump { id: String, capacity: f64 },
}

type StructureBuilder = fn(&mut SectionReader<'_>) -> Result<Structure, FileModelError>;

fn structure_registry() -> HashMap<&'static str, StructureBuilder> {
    let mut registry: HashMap<&'static str, StructureBuilder> = HashMap::new();
    registry.insert("weir", |reader| {
        Ok(Structure::Weir {
            id: reader.required(&["id"])?,
            crest_level: reader.required(&["crestLevel"])?,
        })
    });
    registry.insert("pump", |reader| {
        Ok(Structure::Pump {
            id: reader.required(&["id"])?,
            capacity: reader.required(&["capacity"])?,
        })
    });
    registry
}

/// A file of `[Structure]` sections, each dispatched on its `type` key.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StructureModel {
    pub(crate) file: FileInfo,
    pub(crate) structures: Vec<Structure>,
}

impl Model for StructureModel {
    file_node_accessors!();
}

impl FileModel for StructureModel {
    type Raw = Document;

    fn ext() -> &'static str {
        ".str"
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

    fn from_raw(document: Document, context: &mut FileLoadContext) -> Result<Self, FileModelError> {
        let registry = structure_registry();
        let mut structures = Vec::new();
        for section in document.sections_named("Structure") {
            let mut reader = SectionReader::new(section);
            let kind: String = reader.required(&["type"])?;
            let build = registry
                .get(kind.to_ascii_lowercase().as_str())
                .ok_or_else(|| FileModelError::UnrecognizedVariant {
                    section: section.header.clone(),
                    value: kind.clone(),
                })?;
            structures.push(build(&mut reader)?);
            reader.finish(context.unknown_keywords_mut(), UnknownKeywordPolicy::Error)?;
        }
        Ok(Self {
            file: FileInfo::default(),
            structures,
        })
    }

    fn write(&self, target: &Path, settings: &SaveSettings) -> Result<(), FileModelError> {
        self.write_serialized(target, settings)
    }
}

impl ParsableFileModel for StructureModel {
    type Parser = IniParser;
    type Serializer = IniSerializer;

    fn parser() -> IniParser {
        IniParser::default()
    }

    fn serializer(settings: &SaveSettings) -> IniSerializer {
        IniSerializer::new(settings.serializer.clone())
    }

    fn to_raw(&self, settings: &SaveSettings) -> Result<Document, FileModelError> {
        let sections = self
            .structures
            .iter()
            .map(|structure| {
                let mut writer = SectionWriter::new("Structure", settings);
                match structure {
                    Structure::Weir { id, crest_level } => writer
                        .value("type", &"weir".to_string())
                        .value("id", id)
                        .value("crestLevel", crest_level),
                    Structure::Pump { id, capacity } => writer
                        .value("type", &"pump".to_string())
                        .value("id", id)
                        .value("capacity", capacity),
                };
                writer.finish()
            })
            .collect();
        let document = Document {
            header_comment: Vec::new(),
            sections,
        };
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::LoadSettings;
    use crate::core::save::SaveOptions;
    use tempfile::tempdir;

    #[test]
    fn test_strict_schema_rejects_unknown_keyword() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("child.ini");
        write_file(&path, "[General]\nfileVersion = 1.00\nlegacy = 1\n");

        let error = ChildModel::load(&path).unwrap_err();
        match error {
            FileModelError::InFile { source, .. } => assert!(matches!(
                *source,
                FileModelError::UnknownKeywords { ref keywords, .. } if keywords == &["legacy".to_string()]
            )),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_lenient_schema_records_unknown_keyword() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("root.root");
        write_file(&path, "[General]\nfileVersion = 1.00\nlegacy = 1\n");

        let mut context = FileLoadContext::new();
        context.initialize_load_settings(LoadSettings::default());
        let root = context.load::<RootModel>(&path).unwrap();

        assert_eq!(root.borrow().general.file_version.as_deref(), Some("1.00"));
        let issues = context.unknown_keywords().issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].keyword, "legacy");
        assert_eq!(issues[0].section, "General");
    }

    #[test]
    fn test_structure_dispatch_on_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("structures.str");
        write_file(
            &path,
            "[Structure]\ntype = weir\nid = w1\ncrestLevel = 1.5d0\n\n[Structure]\ntype = Pump\nid = p1\ncapacity = 2\n",
        );

        let model = StructureModel::load(&path).unwrap();
        assert_eq!(
            model.borrow().structures,
            vec![
                Structure::Weir {
                    id: "w1".into(),
                    crest_level: 1.5
                },
                Structure::Pump {
                    id: "p1".into(),
                    capacity: 2.0
                }
            ]
        );

        let target = dir.path().join("copy.str");
        model
            .borrow_mut()
            .save(&SaveOptions::new().with_filepath(&target))
            .unwrap();
        let reloaded = StructureModel::load(&target).unwrap();
        assert_eq!(reloaded.borrow().structures, model.borrow().structures);
    }

    #[test]
    fn test_unrecognized_structure_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("structures.str");
        write_file(&path, "[Structure]\ntype = culvert\nid = c1\n");

        let error = StructureModel::load(&path).unwrap_err();
        match error {
            FileModelError::InFile { source, .. } => assert!(matches!(
                *source,
                FileModelError::UnrecognizedVariant { ref value, .. } if value == "culvert"
            )),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_grid_alias_is_accepted() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join("grid_net.nc"), "grid");
        write_file(&dir.path().join("root.root"), "[Files]\nnetFile = grid_net.nc\n");

        let root = RootModel::load(dir.path().join("root.root")).unwrap();
        assert!(root.borrow().files.grid_file.is_some());
    }
}

// src/ini/section.rs

//! Typed access to the raw sections of a parsed [`Document`].
//!
//! [`SectionReader`] pulls typed fields out of a section, accepting every on-disk alias
//! of a key, and remembers which keys it consumed so that leftovers can be reported
//! through the [`UnknownKeywordErrorManager`]. [`SectionWriter`] is the inverse.

use crate::constants::DEFAULT_LIST_DELIMITER;
use crate::core::base::FileModelError;
use crate::core::file_model::{FileLink, FileModel};
use crate::core::save::SaveSettings;
use crate::ini::models::{Datablock, Document, Property, Section};
use crate::ini::values::{IniValue, split_list};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// How a schema reacts to keys it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeywordPolicy {
    /// Fail the load.
    #[default]
    Error,
    /// Log a warning, record the keyword and carry on without it.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyword {
    pub section: String,
    pub keyword: String,
}

/// Collects unknown-keyword issues for one top-level load.
#[derive(Debug, Clone, Default)]
pub struct UnknownKeywordErrorManager {
    issues: Vec<UnknownKeyword>,
}

impl UnknownKeywordErrorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `policy` to the `keywords` left over in `section`.
    ///
    /// # Errors
    /// Returns [`FileModelError::UnknownKeywords`] under [`UnknownKeywordPolicy::Error`]
    /// when `keywords` is not empty.
    pub fn raise_for_unknown_keywords(
        &mut self,
        section: &str,
        keywords: &[String],
        policy: UnknownKeywordPolicy,
    ) -> Result<(), FileModelError> {
        if keywords.is_empty() {
            return Ok(());
        }
        match policy {
            UnknownKeywordPolicy::Error => Err(FileModelError::UnknownKeywords {
                section: section.to_string(),
                keywords: keywords.to_vec(),
            }),
            UnknownKeywordPolicy::Warn => {
                for keyword in keywords {
                    warn!("Unknown keyword '{}' in section [{}] ignored.", keyword, section);
                    self.issues.push(UnknownKeyword {
                        section: section.to_string(),
                        keyword: keyword.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Keywords ignored under the lenient policy, in the order they were found.
    pub fn issues(&self) -> &[UnknownKeyword] {
        &self.issues
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }
}

/// Returns the first section named `header`, or a missing-section error.
pub fn require_section<'a>(document: &'a Document, header: &str) -> Result<&'a Section, FileModelError> {
    document
        .section(header)
        .ok_or_else(|| FileModelError::MissingSection {
            section: header.to_string(),
        })
}

#[derive(Debug)]
pub struct SectionReader<'a> {
    section: &'a Section,
    consumed: HashSet<String>,
}

impl<'a> SectionReader<'a> {
    pub fn new(section: &'a Section) -> Self {
        Self {
            section,
            consumed: HashSet::new(),
        }
    }

    pub fn header(&self) -> &'a str {
        &self.section.header
    }

    /// Finds the first property matching any of `aliases` and marks all of them consumed.
    fn lookup(&mut self, aliases: &[&str]) -> Option<&'a Property> {
        for alias in aliases {
            self.consumed.insert(alias.to_ascii_lowercase());
        }
        aliases.iter().find_map(|alias| self.section.get(alias))
    }

    fn convert<T: IniValue>(&self, key: &str, raw: &str) -> Result<T, FileModelError> {
        T::from_ini(raw).map_err(|reason| FileModelError::InvalidValue {
            section: self.section.header.clone(),
            key: key.to_string(),
            reason,
        })
    }

    /// The raw value of the first matching alias.
    pub fn raw(&mut self, aliases: &[&str]) -> Option<&'a str> {
        self.lookup(aliases)
            .and_then(|property| property.value.as_deref())
    }

    /// The inline comment attached to the first matching alias.
    pub fn comment(&mut self, aliases: &[&str]) -> Option<&'a str> {
        self.lookup(aliases)
            .and_then(|property| property.comment.as_deref())
    }

    /// An optional field. A key without a value counts as unset.
    pub fn optional<T: IniValue>(&mut self, aliases: &[&str]) -> Result<Option<T>, FileModelError> {
        let Some(property) = self.lookup(aliases) else {
            return Ok(None);
        };
        match property.value.as_deref() {
            Some(raw) => self.convert(&property.key, raw).map(Some),
            None => Ok(None),
        }
    }

    /// A required field.
    ///
    /// # Errors
    /// [`FileModelError::MissingField`] if no alias is present with a value.
    pub fn required<T: IniValue>(&mut self, aliases: &[&str]) -> Result<T, FileModelError> {
        self.optional(aliases)?
            .ok_or_else(|| FileModelError::MissingField {
                section: self.section.header.clone(),
                key: aliases.first().copied().unwrap_or_default().to_string(),
            })
    }

    /// A list field split on `delimiter` (see [`split_list`]). Missing means empty.
    pub fn list<T: IniValue>(
        &mut self,
        aliases: &[&str],
        delimiter: &str,
    ) -> Result<Vec<T>, FileModelError> {
        let Some(property) = self.lookup(aliases) else {
            return Ok(Vec::new());
        };
        let Some(raw) = property.value.as_deref() else {
            return Ok(Vec::new());
        };
        split_list(raw, delimiter)
            .into_iter()
            .map(|item| self.convert(&property.key, item))
            .collect()
    }

    /// A list field using the default (whitespace) delimiter.
    pub fn vector<T: IniValue>(&mut self, aliases: &[&str]) -> Result<Vec<T>, FileModelError> {
        self.list(aliases, DEFAULT_LIST_DELIMITER)
    }

    /// Every occurrence of a repeated key, in file order.
    pub fn all<T: IniValue>(&mut self, aliases: &[&str]) -> Result<Vec<T>, FileModelError> {
        for alias in aliases {
            self.consumed.insert(alias.to_ascii_lowercase());
        }
        let section = self.section;
        section
            .properties()
            .filter(|property| aliases.iter().any(|alias| property.key.eq_ignore_ascii_case(alias)))
            .filter_map(|property| property.value.as_deref().map(|raw| (property, raw)))
            .map(|(property, raw)| self.convert(&property.key, raw))
            .collect()
    }

    pub fn datablock(&self) -> Option<&'a Datablock> {
        self.section.datablock.as_ref()
    }

    /// The datablock with every cell converted, e.g. to numbers. Missing means empty.
    pub fn datablock_values<T: IniValue>(&self) -> Result<Vec<Vec<T>>, FileModelError> {
        let Some(rows) = self.datablock() else {
            return Ok(Vec::new());
        };
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| self.convert("datablock", cell))
                    .collect()
            })
            .collect()
    }

    /// Keys not consumed so far, in file order and without repeats.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.section
            .properties()
            .filter(|property| {
                let lower = property.key.to_ascii_lowercase();
                !self.consumed.contains(&lower) && seen.insert(lower)
            })
            .map(|property| property.key.clone())
            .collect()
    }

    /// Hands the leftover keys to `manager` under `policy`.
    pub fn finish(
        self,
        manager: &mut UnknownKeywordErrorManager,
        policy: UnknownKeywordPolicy,
    ) -> Result<(), FileModelError> {
        manager.raise_for_unknown_keywords(&self.section.header, &self.unknown_keys(), policy)
    }
}

/// Builds a [`Section`] from typed values.
#[derive(Debug)]
pub struct SectionWriter<'s> {
    section: Section,
    settings: &'s SaveSettings,
}

impl<'s> SectionWriter<'s> {
    pub fn new(header: &str, settings: &'s SaveSettings) -> Self {
        Self {
            section: Section::new(header),
            settings,
        }
    }

    pub fn value<T: IniValue>(&mut self, key: &str, value: &T) -> &mut Self {
        let rendered = value.to_ini(&self.settings.serializer);
        self.section.push_property(Property::new(key, Some(rendered)));
        self
    }

    /// Writes `value`, or an empty key when unset. Unset keys are left out entirely when
    /// saving with `exclude_unset`.
    pub fn optional<T: IniValue>(&mut self, key: &str, value: Option<&T>) -> &mut Self {
        match value {
            Some(value) => self.value(key, value),
            None if self.settings.exclude_unset => self,
            None => {
                self.section.push_property(Property::new(key, None));
                self
            }
        }
    }

    pub fn list<T: IniValue>(&mut self, key: &str, values: &[T], delimiter: &str) -> &mut Self {
        let joined = values
            .iter()
            .map(|value| value.to_ini(&self.settings.serializer))
            .collect::<Vec<_>>()
            .join(delimiter);
        self.section.push_property(Property::new(key, Some(joined)));
        self
    }

    pub fn vector<T: IniValue>(&mut self, key: &str, values: &[T]) -> &mut Self {
        self.list(key, values, DEFAULT_LIST_DELIMITER)
    }

    /// Writes a file reference rendered in the save path style.
    pub fn file_reference(&mut self, key: &str, path: Option<&Path>) -> &mut Self {
        match path {
            Some(path) => {
                let rendered = self.settings.render_path(path);
                self.section.push_property(Property::new(key, Some(rendered)));
                self
            }
            None => self.optional::<String>(key, None),
        }
    }

    /// Writes a reference to a linked file model, spelled relative to the file being
    /// written (see [`SaveSettings::reference_path`]).
    pub fn file_link<M: FileModel>(&mut self, key: &str, link: Option<&FileLink<M>>) -> &mut Self {
        let path = link.and_then(|link| self.link_path(link));
        self.file_reference(key, path.as_deref())
    }

    /// Writes references to several linked models joined by `delimiter` under one key.
    /// Nothing to reference counts as unset.
    pub fn file_links<'l, M: FileModel>(
        &mut self,
        key: &str,
        links: impl IntoIterator<Item = &'l FileLink<M>>,
        delimiter: &str,
    ) -> &mut Self {
        let paths: Vec<_> = links
            .into_iter()
            .filter_map(|link| self.link_path(link))
            .collect();
        if paths.is_empty() {
            return self.optional::<String>(key, None);
        }
        self.file_references(key, paths.iter().map(|path| path.as_path()), delimiter)
    }

    fn link_path<M: FileModel>(&self, link: &FileLink<M>) -> Option<std::path::PathBuf> {
        let model = link.try_borrow().ok()?;
        self.settings.reference_path(model.file_info())
    }

    /// Writes several references joined by `delimiter` under one key.
    pub fn file_references<'p>(
        &mut self,
        key: &str,
        paths: impl IntoIterator<Item = &'p Path>,
        delimiter: &str,
    ) -> &mut Self {
        let joined = paths
            .into_iter()
            .map(|path| self.settings.render_path(path))
            .collect::<Vec<_>>()
            .join(delimiter);
        self.section.push_property(Property::new(key, Some(joined)));
        self
    }

    pub fn comment(&mut self, line: &str) -> &mut Self {
        self.section.push_comment(line);
        self
    }

    pub fn datablock(&mut self, rows: Datablock) -> &mut Self {
        self.section.datablock = Some(rows);
        self
    }

    pub fn finish(self) -> Section {
        self.section
    }
}

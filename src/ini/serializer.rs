// src/ini/serializer.rs

use crate::constants::{
    DEFAULT_COMMENT_DELIMITER, DEFAULT_DATABLOCK_INDENT, DEFAULT_DATABLOCK_SPACING,
    DEFAULT_PROPERTY_INDENT, DEFAULT_SECTION_INDENT,
};
use crate::ini::models::{ContentElement, Datablock, Document, Property, Section};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Layout options for writing documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub section_indent: usize,
    pub property_indent: usize,
    pub datablock_indent: usize,
    /// Minimum number of spaces between data block columns.
    pub datablock_spacing: usize,
    pub comment_delimiter: char,
    /// Fixed number of decimals for float fields; `None` writes the shortest exact form.
    pub float_precision: Option<usize>,
    /// Leave out properties that have no value.
    pub skip_empty_properties: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            section_indent: DEFAULT_SECTION_INDENT,
            property_indent: DEFAULT_PROPERTY_INDENT,
            datablock_indent: DEFAULT_DATABLOCK_INDENT,
            datablock_spacing: DEFAULT_DATABLOCK_SPACING,
            comment_delimiter: DEFAULT_COMMENT_DELIMITER,
            float_precision: None,
            skip_empty_properties: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniSerializer {
    config: SerializerConfig,
}

impl IniSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Renders `document` as text. Keys and inline comments are aligned per section,
    /// sections are separated by one blank line and the output ends with a newline.
    pub fn serialize(&self, document: &Document) -> String {
        let mut out = String::new();

        for line in &document.header_comment {
            self.write_comment_line(&mut out, 0, line);
        }
        if !document.header_comment.is_empty() && !document.sections.is_empty() {
            out.push('\n');
        }

        for (index, section) in document.sections.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            self.write_section(&mut out, section);
        }
        out
    }

    fn write_section(&self, out: &mut String, section: &Section) {
        let _ = writeln!(
            out,
            "{:indent$}[{}]",
            "",
            section.header,
            indent = self.config.section_indent
        );

        let visible: Vec<&Property> = section
            .properties()
            .filter(|property| self.is_written(property))
            .collect();
        let key_width = visible.iter().map(|p| p.key.len()).max().unwrap_or(0);
        let value_width = visible
            .iter()
            .filter(|p| p.comment.is_some())
            .map(|p| p.value.as_deref().map_or(0, str::len))
            .max()
            .unwrap_or(0);

        for element in &section.content {
            match element {
                ContentElement::Property(property) if self.is_written(property) => {
                    self.write_property(out, property, key_width, value_width);
                }
                ContentElement::Property(_) => {}
                ContentElement::Comment(block) => {
                    for line in &block.lines {
                        self.write_comment_line(out, self.config.property_indent, line);
                    }
                }
            }
        }

        if let Some(rows) = &section.datablock {
            self.write_datablock(out, rows);
        }
    }

    fn is_written(&self, property: &Property) -> bool {
        !(self.config.skip_empty_properties && property.value.is_none())
    }

    fn write_property(
        &self,
        out: &mut String,
        property: &Property,
        key_width: usize,
        value_width: usize,
    ) {
        let value = property.value.as_deref().unwrap_or_default();
        let mut line = format!(
            "{:indent$}{:<key_width$} = ",
            "",
            property.key,
            indent = self.config.property_indent
        );
        match &property.comment {
            Some(comment) => {
                let _ = write!(
                    line,
                    "{:<value_width$} {} {}",
                    value, self.config.comment_delimiter, comment
                );
            }
            None => line.push_str(value),
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    fn write_comment_line(&self, out: &mut String, indent: usize, line: &str) {
        let text = if line.is_empty() {
            self.config.comment_delimiter.to_string()
        } else {
            format!("{} {}", self.config.comment_delimiter, line)
        };
        let _ = writeln!(out, "{:indent$}{}", "", text);
    }

    fn write_datablock(&self, out: &mut String, rows: &Datablock) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                rows.iter()
                    .filter_map(|row| row.get(column))
                    .map(String::len)
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let gap = " ".repeat(self.config.datablock_spacing.max(1));

        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:<width$}", cell))
                .collect();
            let line = format!(
                "{:indent$}{}",
                "",
                cells.join(&gap),
                indent = self.config.datablock_indent
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
}

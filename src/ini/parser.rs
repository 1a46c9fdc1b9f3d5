// src/ini/parser.rs

//! Line-oriented parser for the section + `key = value` text format.

use crate::constants::DEFAULT_COMMENT_DELIMITER;
use crate::ini::models::{CommentBlock, ContentElement, Document, Property, Section};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a key occurs more than once in one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Keep every occurrence; readers can collect them into a list.
    #[default]
    Collect,
    /// Reject the document.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub comment_delimiter: char,
    /// Treat lines without `=` inside a section as rows of a data block.
    /// When disabled such lines become keys without a value.
    pub parse_datablocks: bool,
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            comment_delimiter: DEFAULT_COMMENT_DELIMITER,
            parse_datablocks: true,
            duplicate_keys: DuplicateKeyPolicy::default(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unterminated section header '{text}'")]
    UnterminatedSection { line: usize, text: String },
    #[error("line {line}: unexpected text after section header '{text}'")]
    TrailingSectionText { line: usize, text: String },
    #[error("line {line}: content outside of any section: '{text}'")]
    OutsideSection { line: usize, text: String },
    #[error("line {line}: empty key in section [{section}]")]
    EmptyKey { line: usize, section: String },
    #[error("line {line}: duplicate key '{key}' in section [{section}]")]
    DuplicateKey {
        line: usize,
        key: String,
        section: String,
    },
    #[error("line {line}: property '{key}' follows the data block of section [{section}]")]
    PropertyAfterDatablock {
        line: usize,
        key: String,
        section: String,
    },
    #[error("line {line}: data block row has {found} columns, expected {expected}")]
    DatablockColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl ParseError {
    /// The 1-based line on which parsing failed.
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedSection { line, .. }
            | Self::TrailingSectionText { line, .. }
            | Self::OutsideSection { line, .. }
            | Self::EmptyKey { line, .. }
            | Self::DuplicateKey { line, .. }
            | Self::PropertyAfterDatablock { line, .. }
            | Self::DatablockColumns { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniParser {
    config: ParserConfig,
}

impl IniParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a complete document.
    ///
    /// # Errors
    /// Returns the first structural error, carrying its line number.
    pub fn parse_str(&self, text: &str) -> Result<Document, ParseError> {
        let mut document = Document::new();
        let mut current: Option<Section> = None;
        let mut after_blank = false;

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                after_blank = true;
                continue;
            }

            if let Some(comment) = line.strip_prefix(self.config.comment_delimiter) {
                let comment = strip_one_space(comment.trim_end()).to_string();
                match current.as_mut() {
                    None => document.header_comment.push(comment),
                    Some(section) => {
                        if after_blank {
                            section
                                .content
                                .push(ContentElement::Comment(CommentBlock::default()));
                        }
                        section.push_comment(comment);
                    }
                }
                after_blank = false;
                continue;
            }
            after_blank = false;

            if line.starts_with('[') {
                let section = self.parse_section_header(line, line_number)?;
                if let Some(finished) = current.replace(section) {
                    document.sections.push(finished);
                }
                continue;
            }

            let Some(section) = current.as_mut() else {
                return Err(ParseError::OutsideSection {
                    line: line_number,
                    text: line.to_string(),
                });
            };
            self.parse_content_line(section, line, line_number)?;
        }

        if let Some(finished) = current {
            document.sections.push(finished);
        }
        log::trace!("Parsed document with {} sections", document.sections.len());
        Ok(document)
    }

    fn parse_section_header(&self, line: &str, line_number: usize) -> Result<Section, ParseError> {
        let Some(end) = line.find(']') else {
            return Err(ParseError::UnterminatedSection {
                line: line_number,
                text: line.to_string(),
            });
        };
        let header = line.get(1..end).unwrap_or_default().trim();
        let rest = line.get(end + 1..).unwrap_or_default().trim();
        if !rest.is_empty() && !rest.starts_with(self.config.comment_delimiter) {
            return Err(ParseError::TrailingSectionText {
                line: line_number,
                text: line.to_string(),
            });
        }

        let mut section = Section::new(header);
        section.start_line = line_number;
        Ok(section)
    }

    fn parse_content_line(
        &self,
        section: &mut Section,
        line: &str,
        line_number: usize,
    ) -> Result<(), ParseError> {
        let (body, comment) = self.split_inline_comment(line);

        let Some((key, value)) = body.split_once('=') else {
            if self.config.parse_datablocks {
                return self.push_datablock_row(section, body, line_number);
            }
            let mut property = Property::new(body, None);
            property.comment = comment;
            property.line = line_number;
            return self.push_property(section, property);
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::EmptyKey {
                line: line_number,
                section: section.header.clone(),
            });
        }
        if section.datablock.is_some() {
            return Err(ParseError::PropertyAfterDatablock {
                line: line_number,
                key: key.to_string(),
                section: section.header.clone(),
            });
        }

        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        let mut property = Property::new(key, value);
        property.comment = comment;
        property.line = line_number;
        self.push_property(section, property)
    }

    fn push_property(&self, section: &mut Section, property: Property) -> Result<(), ParseError> {
        if self.config.duplicate_keys == DuplicateKeyPolicy::Error
            && section.get(&property.key).is_some()
        {
            return Err(ParseError::DuplicateKey {
                line: property.line,
                key: property.key,
                section: section.header.clone(),
            });
        }
        section.push_property(property);
        Ok(())
    }

    fn push_datablock_row(
        &self,
        section: &mut Section,
        body: &str,
        line_number: usize,
    ) -> Result<(), ParseError> {
        let row: Vec<String> = body
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let rows = section.datablock.get_or_insert_with(Vec::new);
        if let Some(expected) = rows.first().map(Vec::len)
            && expected != row.len()
        {
            return Err(ParseError::DatablockColumns {
                line: line_number,
                expected,
                found: row.len(),
            });
        }
        rows.push(row);
        Ok(())
    }

    fn split_inline_comment<'a>(&self, line: &'a str) -> (&'a str, Option<String>) {
        match line.split_once(self.config.comment_delimiter) {
            Some((body, comment)) => {
                let comment = comment.trim();
                (
                    body.trim(),
                    (!comment.is_empty()).then(|| comment.to_string()),
                )
            }
            None => (line.trim(), None),
        }
    }
}

fn strip_one_space(text: &str) -> &str {
    text.strip_prefix(' ').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Document, ParseError> {
        IniParser::default().parse_str(text)
    }

    #[test]
    fn test_parse_header_sections_and_properties() {
        let text = "# Generated file\n#   second line\n\n[General]\nfileVersion = 1.00 # version\n\n[Data]\nvalue = 3 1.5d-3\n";
        let document = parse(text).unwrap();

        assert_eq!(document.header_comment, vec!["Generated file", "  second line"]);
        assert_eq!(document.sections.len(), 2);

        let general = &document.sections[0];
        assert_eq!(general.header, "General");
        assert_eq!(general.start_line, 4);
        let version = general.get("fileVersion").unwrap();
        assert_eq!(version.value.as_deref(), Some("1.00"));
        assert_eq!(version.comment.as_deref(), Some("version"));
        assert_eq!(version.line, 5);

        assert_eq!(document.sections[1].value("value"), Some("3 1.5d-3"));
    }

    #[test]
    fn test_empty_value_becomes_none() {
        let document = parse("[A]\nkey =\n").unwrap();
        let property = document.sections[0].get("key").unwrap();
        assert!(property.value.is_none());
    }

    #[test]
    fn test_comments_inside_sections_are_preserved() {
        let document = parse("[A]\n# about a\na = 1\n# trailing\n").unwrap();
        let content = &document.sections[0].content;
        assert_eq!(content.len(), 3);
        assert!(matches!(&content[0], ContentElement::Comment(block) if block.lines == ["about a"]));
        assert!(matches!(&content[2], ContentElement::Comment(block) if block.lines == ["trailing"]));
    }

    #[test]
    fn test_text_outside_section_fails_with_line() {
        let error = parse("# header\nkey = value\n").unwrap_err();
        assert!(matches!(error, ParseError::OutsideSection { line: 2, .. }));
        assert_eq!(error.line(), 2);
    }

    #[test]
    fn test_unterminated_section_fails() {
        let error = parse("[General\nkey = 1\n").unwrap_err();
        assert!(matches!(error, ParseError::UnterminatedSection { line: 1, .. }));
    }

    #[test]
    fn test_section_header_may_carry_comment() {
        let document = parse("[General] # main\na = 1\n").unwrap();
        assert_eq!(document.sections[0].header, "General");
        assert!(parse("[General] junk\n").is_err());
    }

    #[test]
    fn test_duplicate_keys_collected_by_default() {
        let document = parse("[A]\nfile = a.ini\nfile = b.ini\n").unwrap();
        let values: Vec<_> = document.sections[0]
            .get_all("file")
            .filter_map(|p| p.value.as_deref())
            .collect();
        assert_eq!(values, vec!["a.ini", "b.ini"]);
    }

    #[test]
    fn test_duplicate_keys_rejected_in_strict_mode() {
        let parser = IniParser::new(ParserConfig {
            duplicate_keys: DuplicateKeyPolicy::Error,
            ..Default::default()
        });
        let error = parser.parse_str("[A]\nfile = a\nFILE = b\n").unwrap_err();
        assert!(matches!(error, ParseError::DuplicateKey { line: 3, .. }));
    }

    #[test]
    fn test_datablock_rows() {
        let document = parse("[forcing]\nname = bnd\n0.0 1.0d0\n60.0 2.0\n").unwrap();
        let rows = document.sections[0].datablock.as_ref().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["0.0", "1.0d0"]);
    }

    #[test]
    fn test_inconsistent_datablock_columns_fail() {
        let error = parse("[forcing]\n0.0 1.0\n60.0 2.0 3.0\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::DatablockColumns {
                line: 3,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_property_after_datablock_fails() {
        let error = parse("[forcing]\n0.0 1.0\nname = x\n").unwrap_err();
        assert!(matches!(error, ParseError::PropertyAfterDatablock { line: 3, .. }));
    }

    #[test]
    fn test_keyword_without_value_when_datablocks_disabled() {
        let parser = IniParser::new(ParserConfig {
            parse_datablocks: false,
            ..Default::default()
        });
        let document = parser.parse_str("[A]\nflag\n").unwrap();
        let property = document.sections[0].get("flag").unwrap();
        assert!(property.value.is_none());
    }
}

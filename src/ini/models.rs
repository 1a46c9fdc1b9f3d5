// src/ini/models.rs

//! The untyped document produced by the INI parser and consumed by the serializer.
//!
//! Concrete schemas dispatch on these raw sections (for example on a `type` key)
//! before turning them into typed models.

use serde::{Deserialize, Serialize};

/// Rows of a tabular data block, each row a list of raw cell values.
pub type Datablock = Vec<Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Comment lines before the first section, without the comment delimiter.
    pub header_comment: Vec<String>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first section named `header` (case-insensitive).
    pub fn section(&self, header: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.header.eq_ignore_ascii_case(header))
    }

    /// Every section named `header` (case-insensitive), in file order.
    pub fn sections_named<'a>(&'a self, header: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections
            .iter()
            .filter(move |section| section.header.eq_ignore_ascii_case(header))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub header: String,
    /// 1-based line of the header; 0 for sections built in memory.
    pub start_line: usize,
    pub content: Vec<ContentElement>,
    pub datablock: Option<Datablock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentElement {
    Property(Property),
    Comment(CommentBlock),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: Option<String>,
    pub comment: Option<String>,
    pub line: usize,
}

impl Property {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            comment: None,
            line: 0,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBlock {
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Default::default()
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.content.iter().filter_map(|element| match element {
            ContentElement::Property(property) => Some(property),
            ContentElement::Comment(_) => None,
        })
    }

    /// The first property whose key matches `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties()
            .find(|property| property.key.eq_ignore_ascii_case(key))
    }

    /// Every property whose key matches `key` (case-insensitive), in file order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties()
            .filter(move |property| property.key.eq_ignore_ascii_case(key))
    }

    /// The raw value of `key`, `None` if it is absent or has no value.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|property| property.value.as_deref())
    }

    pub fn push_property(&mut self, property: Property) {
        self.content.push(ContentElement::Property(property));
    }

    pub fn push_comment(&mut self, line: impl Into<String>) {
        let line = line.into();
        if let Some(ContentElement::Comment(block)) = self.content.last_mut() {
            block.lines.push(line);
        } else {
            self.content.push(ContentElement::Comment(CommentBlock { lines: vec![line] }));
        }
    }
}

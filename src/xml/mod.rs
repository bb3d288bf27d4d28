//! # Metadata Document XML Support
//!
//! Parsing, element selection and serialization of ISO-19139 metadata
//! documents, built on `xot`.
//!
//! ## Namespace handling
//!
//! The prefix mapping is always re-derived from the namespace declarations
//! of the parsed document ([`NamespaceMap::from_tree`]) rather than assumed,
//! then checked against the standard ISO-19139 bindings. `xot` keeps namespace
//! declarations where they were parsed, so a serialized document carries its
//! original prefixes; [`MetadataDocument::to_xml_string`] re-scans the output
//! and refuses to return a document whose declarations changed.

mod element_path;
mod namespaces;

pub use element_path::ElementPath;
pub use namespaces::{NamespaceMap, ISO_19139_NAMESPACES};

use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use xot::output::xml::{Declaration, Parameters};
use xot::output::Indentation;
use xot::{Node, Xot};

/// A parsed metadata document
pub struct MetadataDocument {
    xot: Xot,
    document: Node,
    root: Node,
    namespaces: NamespaceMap,
}

impl MetadataDocument {
    /// Parse a document and validate its namespace bindings
    pub fn parse(xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

        let mut xot = Xot::new();
        let document = xot.parse(xml).map_err(|e| Error::Xml {
            message: format!("failed to parse document: {}", e),
        })?;
        let root = xot.document_element(document).map_err(|e| Error::Xml {
            message: format!("document has no root element: {}", e),
        })?;

        let namespaces = NamespaceMap::from_tree(&xot, document);
        namespaces.validate_iso()?;

        Ok(Self {
            xot,
            document,
            root,
            namespaces,
        })
    }

    /// Read and parse a document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml).map_err(|e| match e {
            Error::Xml { message } => Error::Xml {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Prefix bindings declared by the document
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Elements matching `path`, resolved against the document's own prefixes
    pub fn select(&mut self, path: &ElementPath) -> Result<Vec<Node>> {
        path.select(&mut self.xot, self.root, &self.namespaces)
    }

    /// Elements matching `path`, resolved against an explicit prefix mapping
    pub fn select_with(&mut self, path: &ElementPath, namespaces: &NamespaceMap) -> Result<Vec<Node>> {
        path.select(&mut self.xot, self.root, namespaces)
    }

    /// Leading text of an element: the first text before its first child
    /// element, never the text of descendants. Comments and processing
    /// instructions in front of it are skipped.
    pub fn element_text(&self, element: Node) -> Option<&str> {
        self.leading_text_node(element)
            .and_then(|node| self.xot.text_str(node))
    }

    fn leading_text_node(&self, element: Node) -> Option<Node> {
        self.xot
            .children(element)
            .take_while(|&child| !self.xot.is_element(child))
            .find(|&child| self.xot.is_text(child))
    }

    /// Leading text of the first element matching `path`
    pub fn first_text(&mut self, path: &ElementPath) -> Result<Option<String>> {
        let first = self.select(path)?.into_iter().next();
        Ok(first.and_then(|node| self.element_text(node).map(str::to_string)))
    }

    /// Replace the first occurrence of `regex` in the text of every element
    /// matching `path`. Elements with empty text are skipped.
    ///
    /// Returns the number of elements whose text changed.
    pub fn replace_in_elements(&mut self, path: &ElementPath, regex: &Regex, replacement: &str) -> Result<usize> {
        let mut changed = 0;
        for element in self.select(path)? {
            let Some(text_node) = self.leading_text_node(element) else {
                continue;
            };
            let Some(text) = self.xot.text_str(text_node) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let updated = regex.replacen(text, 1, replacement);
            if updated != text {
                let updated = updated.into_owned();
                if let Some(text) = self.xot.text_mut(text_node) {
                    text.set(updated);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Serialize with an XML declaration, UTF-8 encoding and indentation.
    ///
    /// Fails with [`Error::Namespace`] if the output's namespace declarations
    /// differ from the original document's.
    pub fn to_xml_string(&mut self) -> Result<String> {
        self.drop_formatting_whitespace()?;

        let parameters = Parameters {
            indentation: Some(Indentation::default()),
            declaration: Some(Declaration {
                encoding: Some("UTF-8".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let xml = self
            .xot
            .serialize_xml_string(parameters, self.document)
            .map_err(|e| Error::Xml {
                message: format!("failed to serialize document: {}", e),
            })?;

        self.namespaces
            .ensure_preserved_in(&NamespaceMap::from_declarations(&xml)?)?;
        Ok(xml)
    }

    /// Remove whitespace-only text between sibling elements so the indenting
    /// serializer produces consistent output. Text inside leaf elements is
    /// left alone.
    fn drop_formatting_whitespace(&mut self) -> Result<()> {
        let formatting: Vec<Node> = self
            .xot
            .descendants(self.root)
            .filter(|&node| {
                self.xot
                    .text_str(node)
                    .is_some_and(|text| text.trim().is_empty())
                    && self.xot.parent(node).is_some_and(|parent| {
                        self.xot.children(parent).any(|child| self.xot.is_element(child))
                    })
            })
            .collect();
        for node in formatting {
            self.xot.remove(node).map_err(|e| Error::Xml {
                message: format!("failed to normalize whitespace: {}", e),
            })?;
        }
        Ok(())
    }
}

//! Change detection
//!
//! Decides, without touching the document, whether a rule would change it.
//! The orchestrator uses this to skip backups, edits and republishing for
//! layers that need nothing done.

use crate::error::Result;
use crate::rule::SubstitutionRule;
use crate::xml::MetadataDocument;
use std::path::Path;

/// Whether `rule` matches the metadata document stored at `path`
pub fn has_match(rule: &SubstitutionRule, path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path)?;
    content_has_match(rule, &content)
}

/// Whether `rule` matches `content`.
///
/// - Without a target element: true when the pattern matches any line.
/// - With a target element: true when the first element matching the path
///   has non-empty leading text that the pattern matches. A missing element
///   or empty text is no match.
pub fn content_has_match(rule: &SubstitutionRule, content: &str) -> Result<bool> {
    let Some(element_path) = rule.element_path()? else {
        return rule.text_has_match(content);
    };

    let mut document = MetadataDocument::parse(content)?;
    let regex = rule.element_regex()?;
    Ok(document
        .first_text(&element_path)?
        .is_some_and(|text| !text.is_empty() && regex.is_match(&text)))
}

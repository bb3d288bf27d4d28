//! Substitution engine
//!
//! Applies one rule to a metadata document on disk. There are two modes:
//!
//! - **Element-scoped** (`target_element` set): the document is parsed, every
//!   element matching the path has the *first* occurrence of the pattern in
//!   its leading text replaced, and the tree is re-serialized with its
//!   original namespace prefixes, an XML declaration and indentation.
//! - **Whole-file** (no target): each line has trailing whitespace stripped
//!   and every occurrence of the pattern replaced. This mode never parses the
//!   XML, so a careless pattern can break the document's structure; it is the
//!   simple path for plain-text rewording.
//!
//! Both modes replace the file atomically and leave it untouched when nothing
//! changed.

use crate::error::Result;
use crate::filesystem::write_atomic;
use crate::rule::SubstitutionRule;
use crate::xml::MetadataDocument;
use log::debug;
use regex::Regex;
use std::path::Path;

/// Apply `rule` to the document at `path`, returning the number of changed
/// lines (whole-file mode) or elements (element-scoped mode)
pub fn apply(rule: &SubstitutionRule, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let (updated, changed) = apply_to_content(rule, &content)?;
    if changed > 0 {
        write_atomic(path, updated.as_bytes())?;
    }
    debug!(
        "Rule '{}' changed {} {} in {}",
        rule.search,
        changed,
        if rule.is_element_scoped() { "element(s)" } else { "line(s)" },
        path.display()
    );
    Ok(changed)
}

/// Apply `rule` to document text, returning the new text and change count
pub fn apply_to_content(rule: &SubstitutionRule, content: &str) -> Result<(String, usize)> {
    match rule.element_path()? {
        Some(element_path) => {
            let mut document = MetadataDocument::parse(content)?;
            let changed =
                document.replace_in_elements(&element_path, &rule.element_regex()?, &rule.replacement())?;
            if changed == 0 {
                return Ok((content.to_string(), 0));
            }
            Ok((document.to_xml_string()?, changed))
        }
        None => Ok(substitute_lines(&rule.line_regex()?, &rule.replacement(), content)),
    }
}

/// Line-by-line global replacement.
///
/// Every output line has its trailing whitespace stripped and ends with `\n`,
/// whether or not it matched.
pub fn substitute_lines(regex: &Regex, replacement: &str, content: &str) -> (String, usize) {
    let mut output = String::with_capacity(content.len());
    let mut changed = 0;
    for line in content.lines() {
        let line = line.trim_end();
        let replaced = regex.replace_all(line, replacement);
        if replaced != line {
            changed += 1;
        }
        output.push_str(&replaced);
        output.push('\n');
    }
    (output, changed)
}

//! Substitution rules
//!
//! A [`SubstitutionRule`] is one entry of the `Text.Mapping` configuration
//! section. Rules are applied in configured order, so a later rule sees the
//! output of an earlier one.
//!
//! `search` is a regular expression. `replace` is written in the historical
//! backslash style (`\1`, `\g<name>`) and is translated to the `regex` crate's
//! `${1}` form by [`translate_replacement`].

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::xml::ElementPath;

/// One configured find-and-replace instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    /// Regular expression to search for.
    pub search: String,
    /// Replacement text. An empty or null value deletes the match.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub replace: String,
    /// Match case-insensitively.
    #[serde(default)]
    pub ignore_case: bool,
    /// Restrict the rule to the text of elements matching this path.
    #[serde(default)]
    pub target_element: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SubstitutionRule {
    /// Create a case-sensitive, whole-document rule
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            ignore_case: false,
            target_element: None,
        }
    }

    /// Set case-insensitive matching
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Scope the rule to elements matching `path`
    pub fn target_element(mut self, path: impl Into<String>) -> Self {
        self.target_element = Some(path.into());
        self
    }

    /// Whether the rule edits element text rather than raw lines
    pub fn is_element_scoped(&self) -> bool {
        self.target_element
            .as_deref()
            .is_some_and(|path| !path.trim().is_empty())
    }

    /// The target element path, parsed
    pub fn element_path(&self) -> Result<Option<ElementPath>> {
        match self.target_element.as_deref() {
            Some(path) if !path.trim().is_empty() => ElementPath::parse(path).map(Some),
            _ => Ok(None),
        }
    }

    /// Pattern used for line-oriented matching over the whole file.
    pub fn line_regex(&self) -> Result<Regex> {
        self.build_regex(false)
    }

    /// Pattern used inside element text, where `.` also matches newlines
    /// because element text may span several lines.
    pub fn element_regex(&self) -> Result<Regex> {
        self.build_regex(true)
    }

    fn build_regex(&self, dot_all: bool) -> Result<Regex> {
        RegexBuilder::new(&self.search)
            .case_insensitive(self.ignore_case)
            .dot_matches_new_line(dot_all)
            .build()
            .map_err(Error::Regex)
    }

    /// Replacement text in `regex` crate syntax
    pub fn replacement(&self) -> String {
        translate_replacement(&self.replace)
    }

    /// Whether any line of `content` matches the rule's search pattern.
    pub fn text_has_match(&self, content: &str) -> Result<bool> {
        let regex = self.line_regex()?;
        Ok(content.lines().any(|line| regex.is_match(line)))
    }

    /// Check the rule can be compiled and its target path parsed
    pub fn validate(&self) -> Result<()> {
        if self.search.is_empty() {
            return Err(Error::Configuration {
                message: "Substitution rule has an empty 'search' value".to_string(),
                hint: Some("Every Text.Mapping entry needs a non-empty search pattern".to_string()),
            });
        }
        self.line_regex().map_err(|e| Error::Configuration {
            message: format!("Invalid search pattern '{}': {}", self.search, e),
            hint: None,
        })?;
        self.element_path().map_err(|e| Error::Configuration {
            message: e.to_string(),
            hint: Some("Paths look like 'gmd:identificationInfo/gmd:MD_DataIdentification/gmd:abstract/gco:CharacterString'".to_string()),
        })?;
        Ok(())
    }
}

/// Translate a backslash-style replacement into `regex` replacement syntax.
///
/// `\1`..`\99` and `\g<name>` become group references, `\n`, `\t`, `\r` and
/// `\\` become the characters they name, and a literal `$` is escaped so it is
/// never read as a group reference.
pub fn translate_replacement(replace: &str) -> String {
    let mut out = String::with_capacity(replace.len());
    let mut chars = replace.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() && d != '0' => {
                    chars.next();
                    let mut group = d.to_string();
                    if let Some(&d2) = chars.peek() {
                        if d2.is_ascii_digit() {
                            group.push(d2);
                            chars.next();
                        }
                    }
                    out.push_str(&format!("${{{}}}", group));
                }
                Some('g') => {
                    let rest: String = chars.clone().collect();
                    match rest.strip_prefix("g<").and_then(|r| r.find('>').map(|end| (r, end))) {
                        Some((r, end)) => {
                            let name = &r[..end];
                            out.push_str(&format!("${{{}}}", name));
                            // 'g', '<', name, '>'
                            for _ in 0..name.chars().count() + 3 {
                                chars.next();
                            }
                        }
                        None => out.push('\\'),
                    }
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('r') => {
                    chars.next();
                    out.push('\r');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_plain_text() {
        assert_eq!(translate_replacement("The Road"), "The Road");
        assert_eq!(translate_replacement(""), "");
    }

    #[test]
    fn test_translate_group_references() {
        assert_eq!(translate_replacement(r"\1-\2"), "${1}-${2}");
        assert_eq!(translate_replacement(r"\12"), "${12}");
        assert_eq!(translate_replacement(r"\g<year>"), "${year}");
    }

    #[test]
    fn test_translate_escapes_dollar() {
        assert_eq!(translate_replacement("costs $5"), "costs $$5");
    }

    #[test]
    fn test_translate_character_escapes() {
        assert_eq!(translate_replacement(r"a\nb"), "a\nb");
        assert_eq!(translate_replacement(r"a\\b"), r"a\b");
        assert_eq!(translate_replacement(r"a\qb"), r"a\qb");
    }

    #[test]
    fn test_replacement_applies_groups() {
        let rule = SubstitutionRule::new(r"CC-BY (\d)\.0", r"CC-BY \1.1 ($)");
        let regex = rule.line_regex().unwrap();
        assert_eq!(
            regex.replace_all("CC-BY 3.0", rule.replacement().as_str()),
            "CC-BY 3.1 ($)"
        );
    }

    #[test]
    fn test_ignore_case() {
        let rule = SubstitutionRule::new("wellington", "").ignore_case(true);
        assert!(rule.text_has_match("Wellington City").unwrap());
        let rule = SubstitutionRule::new("wellington", "");
        assert!(!rule.text_has_match("Wellington City").unwrap());
    }

    #[test]
    fn test_element_regex_is_dot_all() {
        let rule = SubstitutionRule::new("first.*second", "x");
        assert!(!rule.line_regex().unwrap().is_match("first\nsecond"));
        assert!(rule.element_regex().unwrap().is_match("first\nsecond"));
    }

    #[test]
    fn test_is_element_scoped() {
        assert!(!SubstitutionRule::new("a", "b").is_element_scoped());
        assert!(!SubstitutionRule::new("a", "b")
            .target_element("  ")
            .is_element_scoped());
        assert!(SubstitutionRule::new("a", "b")
            .target_element(".//gmd:abstract")
            .is_element_scoped());
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let err = SubstitutionRule::new("(unclosed", "x").validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Invalid search pattern"));
    }

    #[test]
    fn test_validate_rejects_bad_path() {
        let err = SubstitutionRule::new("a", "b")
            .target_element("gmd:abstract[1]")
            .validate()
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_deserialize_null_replace() {
        let rule: SubstitutionRule =
            serde_yaml::from_str("search: Kelp\nreplace:\nignore_case: true").unwrap();
        assert_eq!(rule.replace, "");
        assert!(rule.ignore_case);
        assert!(rule.target_element.is_none());
    }
}

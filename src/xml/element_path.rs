//! Element path expressions
//!
//! A small subset of the ElementTree path language, enough to address
//! elements of an ISO-19139 document:
//!
//! | Syntax             | Meaning                                         |
//! |--------------------|-------------------------------------------------|
//! | `a/b`              | `b` children of `a` children of the root element |
//! | `.//a/b`, `//a/b`  | `b` children of `a` elements at any depth        |
//! | `a//b`             | `b` descendants of `a` children of the root      |
//! | `*`                | any element                                     |
//! | `prefix:local`     | namespaced name, prefix resolved per document    |
//! | `{uri}local`       | namespaced name with an explicit URI             |
//! | `local`            | name in no namespace                            |
//!
//! A leading `./` is ignored. Predicates (`[...]`), `..` and attribute steps
//! are not supported.

use crate::error::{Error, Result};
use crate::xml::NamespaceMap;
use std::fmt;
use std::str::FromStr;
use xot::{NameId, Node, Xot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Prefixed { prefix: String, local: String },
    Qualified { uri: String, local: String },
    Local(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
}

/// A parsed element path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    source: String,
    steps: Vec<Step>,
}

impl ElementPath {
    /// Parse a path expression
    pub fn parse(path: &str) -> Result<Self> {
        let source = path.trim();
        let fail = |message: &str| Error::ElementPath {
            path: source.to_string(),
            message: message.to_string(),
        };

        if source.is_empty() {
            return Err(fail("path is empty"));
        }

        // ElementTree treats an absolute path as relative to the root element
        let relative = if source.starts_with('/') {
            format!(".{}", source)
        } else {
            source.to_string()
        };

        let mut steps = Vec::new();
        let mut descendant = false;
        for (index, segment) in split_segments(&relative).into_iter().enumerate() {
            match segment {
                "" => {
                    if descendant || index == 0 {
                        return Err(fail("unexpected '/'"));
                    }
                    descendant = true;
                }
                "." if steps.is_empty() && !descendant => {}
                "." | ".." => return Err(fail("'.' and '..' are only allowed as a leading './'")),
                name => {
                    steps.push(Step {
                        axis: if descendant { Axis::Descendant } else { Axis::Child },
                        test: parse_name_test(name).map_err(|m| fail(&m))?,
                    });
                    descendant = false;
                }
            }
        }

        if descendant {
            return Err(fail("path ends with '/'"));
        }

        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Namespace prefixes the path refers to
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match &step.test {
            NameTest::Prefixed { prefix, .. } => Some(prefix.as_str()),
            _ => None,
        })
    }

    /// All elements matching the path, in document order.
    ///
    /// Evaluation starts at `root` (the document element), so the first
    /// child step matches children of the root, as in ElementTree.
    pub fn select(&self, xot: &mut Xot, root: Node, namespaces: &NamespaceMap) -> Result<Vec<Node>> {
        let names = self
            .steps
            .iter()
            .map(|step| self.resolve_name(xot, &step.test, namespaces))
            .collect::<Result<Vec<Option<NameId>>>>()?;

        let mut current = vec![root];
        for (step, name) in self.steps.iter().zip(names) {
            let mut next: Vec<Node> = Vec::new();
            for &context in &current {
                let candidates: Vec<Node> = match step.axis {
                    Axis::Child => xot.children(context).collect(),
                    Axis::Descendant => xot.descendants(context).skip(1).collect(),
                };
                for node in candidates {
                    let matches = xot
                        .element(node)
                        .is_some_and(|element| name.is_none_or(|n| element.name() == n));
                    if matches && !next.contains(&node) {
                        next.push(node);
                    }
                }
            }
            current = next;
        }
        Ok(current)
    }

    fn resolve_name(&self, xot: &mut Xot, test: &NameTest, namespaces: &NamespaceMap) -> Result<Option<NameId>> {
        Ok(match test {
            NameTest::Any => None,
            NameTest::Local(local) => Some(xot.add_name(local)),
            NameTest::Qualified { uri, local } => {
                let ns = xot.add_namespace(uri);
                Some(xot.add_name_ns(local, ns))
            }
            NameTest::Prefixed { prefix, local } => {
                let uri = namespaces.resolve(prefix).ok_or_else(|| Error::ElementPath {
                    path: self.source.clone(),
                    message: format!("namespace prefix '{}' is not declared in the document", prefix),
                })?;
                let ns = xot.add_namespace(uri);
                Some(xot.add_name_ns(local, ns))
            }
        })
    }
}

impl FromStr for ElementPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on '/' except inside `{uri}` blocks.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in path.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    segments
}

fn parse_name_test(name: &str) -> std::result::Result<NameTest, String> {
    if name == "*" {
        return Ok(NameTest::Any);
    }
    if name.contains('[') || name.contains('@') || name.contains('(') {
        return Err(format!("unsupported step '{}'", name));
    }
    if let Some(rest) = name.strip_prefix('{') {
        let (uri, local) = rest
            .split_once('}')
            .ok_or_else(|| format!("unterminated '{{' in '{}'", name))?;
        check_local(local, name)?;
        return Ok(NameTest::Qualified {
            uri: uri.to_string(),
            local: local.to_string(),
        });
    }
    match name.split_once(':') {
        Some((prefix, local)) => {
            if prefix.is_empty() {
                return Err(format!("empty prefix in '{}'", name));
            }
            check_local(local, name)?;
            Ok(NameTest::Prefixed {
                prefix: prefix.to_string(),
                local: local.to_string(),
            })
        }
        None => {
            check_local(name, name)?;
            Ok(NameTest::Local(name.to_string()))
        }
    }
}

fn check_local(local: &str, step: &str) -> std::result::Result<(), String> {
    if local.is_empty() || local.contains(':') || local.contains(char::is_whitespace) {
        return Err(format!("invalid element name '{}'", step));
    }
    Ok(())
}

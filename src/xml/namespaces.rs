//! Namespace prefix discovery and ISO-19139 validation

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use xot::{Node, Xot};

/// The namespace set ISO-19139 metadata documents are expected to use.
pub const ISO_19139_NAMESPACES: [(&str, &str); 5] = [
    ("gmd", "http://www.isotc211.org/2005/gmd"),
    ("gco", "http://www.isotc211.org/2005/gco"),
    ("srv", "http://www.isotc211.org/2005/srv"),
    ("gml", "http://www.opengis.net/gml"),
    ("xlink", "http://www.w3.org/1999/xlink"),
];

/// Prefix to namespace URI bindings
///
/// Built either from the fixed ISO-19139 set or by scanning a document's own
/// `xmlns` declarations, so prefixes that differ from the usual ones still
/// resolve. The default (unprefixed) namespace is tracked separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    prefixes: BTreeMap<String, String>,
    default: Option<String>,
}

impl NamespaceMap {
    /// An empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard ISO-19139 bindings
    pub fn iso19139() -> Self {
        let mut map = Self::new();
        for (prefix, uri) in ISO_19139_NAMESPACES {
            map.insert(prefix, uri);
        }
        map
    }

    /// Collect the namespace declarations of `node` and every element below
    /// it, in document order.
    ///
    /// When a prefix is declared more than once the first binding wins.
    /// Only declarations on elements count; look-alike text in comments or
    /// processing instructions is ignored.
    pub fn from_tree(xot: &Xot, node: Node) -> Self {
        let mut map = Self::new();
        for element in xot.descendants(node).filter(|&n| xot.is_element(n)) {
            for (prefix, namespace) in xot.namespace_declarations(element) {
                let prefix = xot.prefix_str(prefix);
                let uri = xot.namespace_str(namespace);
                if prefix.is_empty() {
                    if map.default.is_none() && !uri.is_empty() {
                        map.default = Some(uri.to_string());
                    }
                } else {
                    map.prefixes
                        .entry(prefix.to_string())
                        .or_insert_with(|| uri.to_string());
                }
            }
        }
        map
    }

    /// Parse `xml` and collect its namespace declarations
    pub fn from_declarations(xml: &str) -> Result<Self> {
        let mut xot = Xot::new();
        let document = xot.parse(xml).map_err(|e| Error::Xml {
            message: format!("failed to parse document: {}", e),
        })?;
        Ok(Self::from_tree(&xot, document))
    }

    /// Bind `prefix` to `uri`, replacing any previous binding
    pub fn insert(&mut self, prefix: &str, uri: &str) {
        self.prefixes.insert(prefix.to_string(), uri.to_string());
    }

    /// URI bound to `prefix`
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// The default namespace URI, if declared
    pub fn default_namespace(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Non-empty prefixes with their URIs, sorted by prefix
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .filter(|(prefix, _)| !prefix.is_empty())
            .map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Fail if a standard ISO-19139 prefix is bound to a non-standard URI.
    ///
    /// Standard prefixes that are simply absent are allowed; documents rarely
    /// declare all five.
    pub fn validate_iso(&self) -> Result<()> {
        for (prefix, expected) in ISO_19139_NAMESPACES {
            if let Some(actual) = self.resolve(prefix) {
                if actual != expected {
                    return Err(Error::Namespace {
                        message: format!(
                            "prefix '{}' is bound to '{}', expected '{}'",
                            prefix, actual, expected
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fail unless `other` declares exactly the same prefixes with the same URIs.
    pub fn ensure_preserved_in(&self, other: &NamespaceMap) -> Result<()> {
        for (prefix, uri) in self.iter() {
            match other.resolve(prefix) {
                Some(found) if found == uri => {}
                Some(found) => {
                    return Err(Error::Namespace {
                        message: format!(
                            "prefix '{}' changed from '{}' to '{}' during serialization",
                            prefix, uri, found
                        ),
                    })
                }
                None => {
                    return Err(Error::Namespace {
                        message: format!("prefix '{}' was lost during serialization", prefix),
                    })
                }
            }
        }
        if let Some((prefix, _)) = other.iter().find(|(p, _)| self.resolve(p).is_none()) {
            return Err(Error::Namespace {
                message: format!("prefix '{}' was introduced during serialization", prefix),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
        xmlns:gco='http://www.isotc211.org/2005/gco' xmlns="urn:default"
        xmlns:xlink = "http://www.w3.org/1999/xlink">
        <gmd:x xmlns:gco="urn:shadow"/>
    </gmd:MD_Metadata>"#;

    #[test]
    fn test_from_declarations() {
        let map = NamespaceMap::from_declarations(ROOT).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.resolve("gmd"), Some("http://www.isotc211.org/2005/gmd"));
        assert_eq!(map.resolve("gco"), Some("http://www.isotc211.org/2005/gco"));
        assert_eq!(map.resolve("xlink"), Some("http://www.w3.org/1999/xlink"));
        assert_eq!(map.default_namespace(), Some("urn:default"));
        assert_eq!(map.resolve("srv"), None);
    }

    #[test]
    fn test_non_standard_prefix_is_discovered() {
        let map = NamespaceMap::from_declarations(
            r#"<md:MD_Metadata xmlns:md="http://www.isotc211.org/2005/gmd"/>"#,
        )
        .unwrap();
        assert_eq!(map.resolve("md"), Some("http://www.isotc211.org/2005/gmd"));
        assert!(map.validate_iso().is_ok());
    }

    #[test]
    fn test_validate_iso_rejects_rebound_prefix() {
        let map =
            NamespaceMap::from_declarations(r#"<gmd:MD_Metadata xmlns:gmd="http://example.com/gmd"/>"#)
                .unwrap();
        let err = map.validate_iso().unwrap_err();
        assert!(matches!(err, Error::Namespace { .. }));
        assert!(err.to_string().contains("gmd"));
    }

    #[test]
    fn test_declarations_in_comments_are_ignored() {
        let xml = r#"<?xml version="1.0"?>
<!-- migrated from a schema using xmlns:gco="urn:legacy-gco" -->
<?stylesheet href="x.xsl" xmlns:gmd="urn:legacy-gmd"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <!-- xmlns:xlink="urn:legacy-xlink" -->
</gmd:MD_Metadata>"#;
        let map = NamespaceMap::from_declarations(xml).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("gco"), Some("http://www.isotc211.org/2005/gco"));
        assert_eq!(map.resolve("gmd"), Some("http://www.isotc211.org/2005/gmd"));
        assert_eq!(map.resolve("xlink"), None);
        assert!(map.validate_iso().is_ok());
    }

    #[test]
    fn test_malformed_xml_is_an_xml_error() {
        let err = NamespaceMap::from_declarations("<gmd:MD_Metadata").unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
    }

    #[test]
    fn test_iso19139_is_valid() {
        let map = NamespaceMap::iso19139();
        assert_eq!(map.len(), 5);
        assert!(map.validate_iso().is_ok());
    }

    #[test]
    fn test_ensure_preserved_in() {
        let original = NamespaceMap::from_declarations(ROOT).unwrap();
        assert!(original.ensure_preserved_in(&original.clone()).is_ok());

        let mut lost = NamespaceMap::new();
        lost.insert("gmd", "http://www.isotc211.org/2005/gmd");
        assert!(original.ensure_preserved_in(&lost).is_err());

        let mut added = original.clone();
        added.insert("ns0", "http://www.isotc211.org/2005/gmd");
        assert!(original.ensure_preserved_in(&added).is_err());
    }
}

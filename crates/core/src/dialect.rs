//! Feed dialect specifications.
//!
//! A [`Dialect`] describes one feed format purely as data: where its items live
//! (`item_root`), which namespace prefixes its selectors use, and which XPath
//! selector produces each story field. Three dialects are built in: Atom
//! (0.3 and 1.0), RSS (0.9x and 2.0) and RDF Site Summary (0.90, 1.0 and 1.1).
//!
//! # Example
//!
//! ```rust
//! use syndicate_core::Dialect;
//!
//! let podcast = Dialect::new("", "rss/channel/item")
//!     .namespace("itunes", "http://www.itunes.com/dtds/podcast-1.0.dtd")
//!     .field("duration", "string(itunes:duration)");
//!
//! let merged = Dialect::rss().merge(&podcast);
//! assert_eq!(merged.name, "RSS");
//! assert!(merged.fields.contains_key("title"));
//! assert!(merged.fields.contains_key("duration"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::selector::referenced_prefixes;
use crate::story::Field;

/// Atom 0.3
pub const ATOM_03_NS: &str = "http://purl.org/atom/ns#";
/// Atom 1.0 (RFC 4287)
pub const ATOM_10_NS: &str = "http://www.w3.org/2005/Atom";
/// Dublin Core element set 1.1
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
/// RDF syntax
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDF Site Summary 0.90
pub const RSS_090_NS: &str = "http://my.netscape.com/rdf/simple/0.9/";
/// RDF Site Summary 1.0 / 1.1
pub const RSS_10_NS: &str = "http://purl.org/rss/1.0/";

/// Description of one feed dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// Tag written into every story this dialect produces. May be empty in an
    /// override of a built-in item root, in which case the built-in name is kept.
    #[serde(default)]
    pub name: String,

    /// Slash-separated element path from the document element to the repeating item.
    pub item_root: String,

    /// Prefix to namespace URI bindings used by `item_root` and `fields`.
    #[serde(default)]
    pub namespaces: IndexMap<String, String>,

    /// Output field name to XPath selector, evaluated relative to one item node.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

/// One step of an item root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub prefix: Option<String>,
    pub local: String,
}

impl Dialect {
    /// Create a dialect with no namespaces and no fields
    pub fn new(name: impl Into<String>, item_root: impl Into<String>) -> Self {
        Self { name: name.into(), item_root: item_root.into(), ..Default::default() }
    }

    /// Bind a namespace prefix
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Map an output field to a selector
    pub fn field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.insert(name.into(), selector.into());
        self
    }

    /// Normalized item root, used as the registry key
    pub fn key(&self) -> &str {
        self.item_root.trim().trim_start_matches('/')
    }

    /// Merge an override into a copy of this dialect.
    ///
    /// Namespace and field entries from `other` replace entries with the same
    /// key; entries only present here are kept. A non-empty name in `other`
    /// replaces this name. `self` is left untouched.
    pub fn merge(&self, other: &Dialect) -> Dialect {
        let mut merged = self.clone();

        if !other.name.is_empty() {
            merged.name = other.name.clone();
        }

        for (prefix, uri) in &other.namespaces {
            merged.namespaces.insert(prefix.clone(), uri.clone());
        }

        for (field, selector) in &other.fields {
            merged.fields.insert(field.clone(), selector.clone());
        }

        merged
    }

    /// Parse `item_root` into path steps
    pub fn steps(&self) -> Result<Vec<PathStep>, ConfigError> {
        let key = self.key();
        if key.is_empty() {
            return Err(ConfigError::EmptyItemRoot { name: self.name.clone() });
        }

        let invalid = |reason: String| ConfigError::InvalidItemRoot {
            name: self.name.clone(),
            item_root: self.item_root.clone(),
            reason,
        };

        key.split('/')
            .map(|segment| {
                let segment = segment.trim();
                let (prefix, local) = match segment.split_once(':') {
                    Some((prefix, local)) => (Some(prefix), local),
                    None => (None, segment),
                };

                if let Some(prefix) = prefix
                    && !is_ncname(prefix)
                {
                    return Err(invalid(format!("'{}' is not a valid prefix", prefix)));
                }
                if !is_ncname(local) {
                    return Err(invalid(format!("'{}' is not an element name", segment)));
                }

                Ok(PathStep { prefix: prefix.map(str::to_string), local: local.to_string() })
            })
            .collect()
    }

    /// Check the dialect is usable: named, with a valid item root, and with every
    /// referenced prefix bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingName { item_root: self.item_root.clone() });
        }

        for step in self.steps()? {
            if let Some(prefix) = step.prefix
                && !self.namespaces.contains_key(&prefix)
            {
                return Err(ConfigError::UnboundPrefix {
                    dialect: self.name.clone(),
                    location: "item_root".to_string(),
                    prefix,
                });
            }
        }

        for (field, selector) in &self.fields {
            if let Some(prefix) = referenced_prefixes(selector)
                .into_iter()
                .find(|prefix| !self.namespaces.contains_key(prefix))
            {
                return Err(ConfigError::UnboundPrefix {
                    dialect: self.name.clone(),
                    location: field.clone(),
                    prefix,
                });
            }
        }

        Ok(())
    }

    /// Atom 0.3 and Atom 1.0, with Dublin Core subjects as tags
    pub fn atom() -> Self {
        Dialect::new("Atom", "feed/entry")
            .namespace("a03", ATOM_03_NS)
            .namespace("a10", ATOM_10_NS)
            .namespace("dc", DC_NS)
            .field(Field::Id.as_str(), "string(a03:id|a10:id)")
            .field(
                Field::Url.as_str(),
                r#"string(a03:link[@rel="alternate"]/@href|a10:link[@rel="alternate" or not(@rel)]/@href)"#,
            )
            .field(Field::Title.as_str(), "string(a03:title|a10:title)")
            .field(Field::Content.as_str(), "string(a03:content|a10:content)")
            .field(Field::Author.as_str(), "string(a03:author/a03:name|a10:author/a10:name)")
            .field(Field::Tags.as_str(), "dc:subject|a10:category/@term")
            .field(Field::Published.as_str(), "string(a03:issued|a10:published)")
            .field(Field::Updated.as_str(), "string(a03:modified|a10:updated)")
    }

    /// RSS 0.91, 0.92 and 2.0. `pubDate` feeds both dates.
    pub fn rss() -> Self {
        Dialect::new("RSS", "rss/channel/item")
            .field(Field::Id.as_str(), "string(guid)")
            .field(Field::Url.as_str(), "string(link)")
            .field(Field::Title.as_str(), "string(title)")
            .field(Field::Content.as_str(), "string(description)")
            .field(Field::Author.as_str(), "string(author)")
            .field(Field::Tags.as_str(), "category")
            .field(Field::Published.as_str(), "string(pubDate)")
            .field(Field::Updated.as_str(), "string(pubDate)")
    }

    /// RDF Site Summary 0.90, 1.0 and 1.1 with Dublin Core.
    ///
    /// The id is `rdf:about`; 0.90 items have no `about`, and since attributes
    /// precede children in document order the union falls back to their `link`.
    pub fn rdf() -> Self {
        Dialect::new("RDF", "rdf:RDF/item")
            .namespace("rdf", RDF_NS)
            .namespace("r090", RSS_090_NS)
            .namespace("r10", RSS_10_NS)
            .namespace("dc", DC_NS)
            .field(Field::Id.as_str(), "string(@rdf:about|r090:link)")
            .field(Field::Url.as_str(), "string(r090:link|r10:link)")
            .field(Field::Title.as_str(), "string(r090:title|r10:title)")
            .field(Field::Content.as_str(), "string(r090:description|r10:description)")
            .field(Field::Author.as_str(), "string(dc:creator)")
            .field(Field::Tags.as_str(), "dc:subject")
            .field(Field::Published.as_str(), "string(dc:date)")
            .field(Field::Updated.as_str(), "string(dc:date)")
    }

    /// The built-in dialects in registration order: Atom, RSS, RDF
    pub fn builtin() -> Vec<Dialect> {
        vec![Dialect::atom(), Dialect::rss(), Dialect::rdf()]
    }
}

/// XML NCName check, restricted to what item roots need
fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

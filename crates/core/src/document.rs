//! XML parsing for feed documents.
//!
//! [`FeedDocument`] wraps a parsed `sxd_document` package. Before parsing, raw
//! feed bytes go through a small cleanup pass controlled by [`ParseOptions`]:
//! decoding, DOCTYPE removal, named entity substitution and namespace
//! declaration repair. Real feeds are rarely strict XML, and the parser only
//! knows the five predefined entities.
//!
//! # Example
//!
//! ```rust
//! use syndicate_core::FeedDocument;
//!
//! let xml = r#"<?xml version="1.0"?>
//! <!DOCTYPE rss PUBLIC "-//Netscape Communications//DTD RSS 0.91//EN" "http://my.netscape.com/publish/formats/rss-0.91.dtd">
//! <rss version="0.91"><channel><item><title>Caf&eacute;</title></item></channel></rss>"#;
//!
//! let doc = FeedDocument::parse(xml.as_bytes()).unwrap();
//! assert_eq!(doc.root_element().unwrap().name().local_part(), "rss");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use sxd_document::Package;
use sxd_document::dom::{ChildOfRoot, Element};

use crate::error::ExtractionError;

/// Options for turning raw feed bytes into a document tree
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reject documents larger than this many bytes. `None` allows any size.
    pub max_bytes: Option<usize>,
    /// Substitute HTML named entities and internal-subset `<!ENTITY>` declarations
    pub resolve_entities: bool,
    /// Remove the DOCTYPE declaration before parsing
    pub strip_doctype: bool,
    /// Remove repeated `xmlns` attributes and declare well-known prefixes used without a declaration
    pub clean_namespaces: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_bytes: None, resolve_entities: true, strip_doctype: true, clean_namespaces: true }
    }
}

/// A parsed feed document
pub struct FeedDocument {
    package: Package,
}

impl FeedDocument {
    /// Parses feed bytes with default options.
    pub fn parse(bytes: &[u8]) -> Result<Self, ExtractionError> {
        Self::parse_with_options(bytes, &ParseOptions::default())
    }

    /// Parses feed bytes with the given options.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::TooLarge`] if `max_bytes` is exceeded
    /// - [`ExtractionError::InvalidEncoding`] if the bytes cannot be decoded
    /// - [`ExtractionError::Parse`] if the cleaned text is not well-formed XML
    pub fn parse_with_options(bytes: &[u8], options: &ParseOptions) -> Result<Self, ExtractionError> {
        if let Some(limit) = options.max_bytes
            && bytes.len() > limit
        {
            return Err(ExtractionError::TooLarge { size: bytes.len(), limit });
        }

        let text = prepare(bytes, options)?;
        let package = sxd_document::parser::parse(&text).map_err(|e| ExtractionError::Parse(e.to_string()))?;

        Ok(Self { package })
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The document element, if the document has one
    pub fn root_element(&self) -> Option<Element<'_>> {
        self.package
            .as_document()
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
    }
}

/// Decode and clean raw bytes into parser-ready text
pub fn prepare(bytes: &[u8], options: &ParseOptions) -> Result<String, ExtractionError> {
    let mut text = decode(bytes)?;

    let declared = if options.resolve_entities { declared_entities(&text) } else { HashMap::new() };

    if options.strip_doctype {
        text = DOCTYPE.replace(&text, "").into_owned();
    }

    if options.resolve_entities {
        text = map_outside_cdata(&text, |segment| resolve_entities(segment, &declared));
    }

    if options.clean_namespaces {
        text = map_outside_cdata(&text, dedupe_namespace_attributes);
    }

    text = inherit_default_namespace(&text);

    if options.clean_namespaces {
        text = declare_missing_prefixes(&text);
    }

    Ok(text)
}

static XML_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\?xml[^>]*\?>").expect("declaration pattern is valid"));

static DECL_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"encoding\s*=\s*["']([A-Za-z0-9._\-]+)["']"#).expect("encoding pattern is valid")
});

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!DOCTYPE[^\[>]*(?:\[[\s\S]*?\]\s*)?>").expect("doctype pattern is valid")
});

static ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_][\w.\-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).expect("entity pattern is valid")
});

static ENTITY_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z_][\w.\-]*);").expect("entity reference pattern is valid"));

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z_][\w.\-:]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)(\s*/?>)"#)
        .expect("start tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+([^\s=/>]+)\s*=\s*("[^"]*"|'[^']*')"#).expect("attribute pattern is valid")
});

/// CDATA, comments, declarations and processing instructions (no capture), end tags (group 1)
/// and start tags (name, attributes, close in groups 2-4)
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<!\[CDATA\[[\s\S]*?\]\]>|<!--[\s\S]*?-->|<[?!][^>]*>|</([A-Za-z_][\w.\-:]*)\s*>|<([A-Za-z_][\w.\-:]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)(\s*/?>)"#,
    )
    .expect("markup pattern is valid")
});

static DEFAULT_NS_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sxmlns\s*=").expect("default namespace pattern is valid"));

/// Decode raw bytes into text.
///
/// UTF-8 (with or without BOM) and UTF-16 with BOM are accepted. Documents
/// declaring ISO-8859-1 are transcoded byte by byte and their declaration is
/// rewritten to UTF-8.
fn decode(bytes: &[u8]) -> Result<String, ExtractionError> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).map_err(|_| ExtractionError::InvalidEncoding);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    if declares_latin1(bytes) {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        return Ok(rewrite_declared_encoding(&text));
    }

    String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError::InvalidEncoding)
}

fn decode_utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> Result<String, ExtractionError> {
    if bytes.len() % 2 != 0 {
        return Err(ExtractionError::InvalidEncoding);
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| read([pair[0], pair[1]])).collect();
    let text = String::from_utf16(&units).map_err(|_| ExtractionError::InvalidEncoding)?;
    Ok(rewrite_declared_encoding(&text))
}

fn declares_latin1(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    XML_DECL
        .find(&head)
        .and_then(|decl| DECL_ENCODING.captures(decl.as_str()))
        .is_some_and(|caps| {
            matches!(
                caps[1].to_ascii_lowercase().as_str(),
                "iso-8859-1" | "latin1" | "latin-1" | "iso8859-1" | "iso_8859-1"
            )
        })
}

fn rewrite_declared_encoding(text: &str) -> String {
    match XML_DECL.find(text) {
        Some(decl) => {
            let rewritten = DECL_ENCODING.replace(decl.as_str(), r#"encoding="UTF-8""#);
            format!("{}{}", rewritten, &text[decl.end()..])
        }
        None => text.to_string(),
    }
}

/// Split `text` into `(is_cdata, segment)` parts
fn split_cdata(text: &str) -> Vec<(bool, &str)> {
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("<![CDATA[") {
        parts.push((false, &rest[..start]));
        let section = &rest[start..];
        match section.find("]]>") {
            Some(end) => {
                parts.push((true, &section[..end + 3]));
                rest = &section[end + 3..];
            }
            None => {
                parts.push((true, section));
                rest = "";
            }
        }
    }

    parts.push((false, rest));
    parts
}

/// Apply `f` to every part of `text` outside CDATA sections
fn map_outside_cdata(text: &str, f: impl Fn(&str) -> String) -> String {
    split_cdata(text)
        .into_iter()
        .map(|(is_cdata, segment)| if is_cdata { segment.to_string() } else { f(segment) })
        .collect()
}

/// General entities declared in the internal DTD subset
fn declared_entities(text: &str) -> HashMap<String, String> {
    let Some(doctype) = DOCTYPE.find(text) else {
        return HashMap::new();
    };

    ENTITY_DECL
        .captures_iter(doctype.as_str())
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

const PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// HTML names for U+00A0 through U+00FF, in code point order
const LATIN1_ENTITIES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf", "laquo", "not", "shy",
    "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro", "para", "middot", "cedil", "sup1", "ordm",
    "raquo", "frac14", "frac12", "frac34", "iquest", "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig",
    "Ccedil", "Egrave", "Eacute", "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve",
    "Oacute", "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute", "THORN",
    "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil", "egrave", "eacute", "ecirc",
    "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde", "ograve", "oacute", "ocirc", "otilde", "ouml",
    "divide", "oslash", "ugrave", "uacute", "ucirc", "uuml", "yacute", "thorn", "yuml",
];

const TYPOGRAPHIC_ENTITIES: &[(&str, u32)] = &[
    ("OElig", 338),
    ("oelig", 339),
    ("Scaron", 352),
    ("scaron", 353),
    ("Yuml", 376),
    ("fnof", 402),
    ("circ", 710),
    ("tilde", 732),
    ("ensp", 8194),
    ("emsp", 8195),
    ("thinsp", 8201),
    ("zwnj", 8204),
    ("zwj", 8205),
    ("lrm", 8206),
    ("rlm", 8207),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("sbquo", 8218),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bdquo", 8222),
    ("dagger", 8224),
    ("Dagger", 8225),
    ("bull", 8226),
    ("hellip", 8230),
    ("permil", 8240),
    ("prime", 8242),
    ("lsaquo", 8249),
    ("rsaquo", 8250),
    ("euro", 8364),
    ("trade", 8482),
];

/// Code point of an HTML named entity
fn html_entity(name: &str) -> Option<u32> {
    if let Some(index) = LATIN1_ENTITIES.iter().position(|&entity| entity == name) {
        return u32::try_from(index).ok().map(|index| 160 + index);
    }
    TYPOGRAPHIC_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|&(_, code)| code)
}

/// Replace named entity references the parser would reject.
///
/// Unknown names are left alone and surface as a parse error.
fn resolve_entities(text: &str, declared: &HashMap<String, String>) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_REF
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            if PREDEFINED_ENTITIES.contains(&name) {
                return caps[0].to_string();
            }
            if let Some(value) = declared.get(name) {
                return value.clone();
            }
            match html_entity(name) {
                Some(code) => format!("&#{};", code),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Drop repeated `xmlns` / `xmlns:p` attributes within one start tag, keeping the first
fn dedupe_namespace_attributes(text: &str) -> String {
    START_TAG
        .replace_all(text, |caps: &Captures| {
            let attributes = &caps[2];
            if !attributes.contains("xmlns") {
                return caps[0].to_string();
            }

            let mut seen: Vec<&str> = Vec::new();
            let mut kept = String::with_capacity(attributes.len());
            let mut duplicated = false;

            for attribute in ATTRIBUTE.captures_iter(attributes) {
                let (Some(whole), Some(name)) = (attribute.get(0), attribute.get(1)) else {
                    continue;
                };
                let name = name.as_str();
                if name == "xmlns" || name.starts_with("xmlns:") {
                    if seen.contains(&name) {
                        duplicated = true;
                        continue;
                    }
                    seen.push(name);
                }
                kept.push_str(whole.as_str());
            }

            if !duplicated {
                return caps[0].to_string();
            }

            tracing::debug!("Removed repeated namespace declaration on <{}>", &caps[1]);
            format!("<{}{}{}", &caps[1], kept, &caps[3])
        })
        .into_owned()
}

/// URIs for prefixes feeds commonly use without declaring them
const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("content", "http://purl.org/rss/1.0/modules/content/"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("atom", "http://www.w3.org/2005/Atom"),
    ("media", "http://search.yahoo.com/mrss/"),
    ("itunes", "http://www.itunes.com/dtds/podcast-1.0.dtd"),
    ("slash", "http://purl.org/rss/1.0/modules/slash/"),
    ("wfw", "http://wellformedweb.org/CommentAPI/"),
    ("sy", "http://purl.org/rss/1.0/modules/syndication/"),
    ("georss", "http://www.georss.org/georss"),
    ("feedburner", "http://rssnamespace.org/feedburner/ext/1.0"),
    ("admin", "http://webns.net/mvcb/"),
];

/// Unquoted value of the `xmlns` attribute in a start tag's attribute list
fn default_namespace_attribute(attributes: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|attribute| &attribute[1] == "xmlns")
        .map(|attribute| {
            let quoted = &attribute[2];
            quoted[1..quoted.len() - 1].to_string()
        })
}

/// Repeat the in-scope default namespace on every unprefixed start tag.
///
/// The parser ignores a default namespace declared on a prefixed element
/// (`<rdf:RDF xmlns="http://purl.org/rss/1.0/">`), leaving the unprefixed
/// items below it without a namespace.
fn inherit_default_namespace(text: &str) -> String {
    if !DEFAULT_NS_DECL.is_match(text) {
        return text.to_string();
    }

    let mut scopes: Vec<Option<String>> = Vec::new();
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in MARKUP.captures_iter(text) {
        if caps.get(1).is_some() {
            scopes.pop();
            continue;
        }
        let (Some(name), Some(attributes), Some(close)) = (caps.get(2), caps.get(3), caps.get(4)) else {
            continue;
        };

        let own = default_namespace_attribute(attributes.as_str());
        let inherited = scopes.last().cloned().flatten();

        if own.is_none()
            && !name.as_str().contains(':')
            && let Some(uri) = inherited.as_deref().filter(|uri| !uri.is_empty())
        {
            output.push_str(&text[last..name.end()]);
            output.push_str(&format!(r#" xmlns="{}""#, uri.replace('"', "&quot;")));
            last = name.end();
        }

        if !close.as_str().contains('/') {
            scopes.push(own.or(inherited));
        }
    }

    output.push_str(&text[last..]);
    output
}

/// Declare prefixes that are used but never declared on the document element
///
/// Only element and attribute names of real start tags count; escaped markup
/// in text and CDATA is ignored.
fn declare_missing_prefixes(text: &str) -> String {
    let mut used: Vec<String> = Vec::new();
    let mut declared: Vec<String> = Vec::new();
    let mut root_end = None;

    for caps in MARKUP.captures_iter(text) {
        let (Some(name), Some(attributes)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        root_end.get_or_insert(name.end());

        let attribute_names = ATTRIBUTE.captures_iter(attributes.as_str()).filter_map(|attribute| attribute.get(1));
        for qualified in std::iter::once(name).chain(attribute_names).map(|m| m.as_str()) {
            let Some((prefix, local)) = qualified.split_once(':') else {
                continue;
            };
            if prefix == "xmlns" {
                declared.push(local.to_string());
            } else if prefix != "xml" && !used.iter().any(|p| p == prefix) {
                used.push(prefix.to_string());
            }
        }
    }

    let missing: Vec<&String> = used.iter().filter(|prefix| !declared.contains(prefix)).collect();
    if missing.is_empty() {
        return text.to_string();
    }

    let Some(root_end) = root_end else {
        return text.to_string();
    };

    let mut declarations = String::new();
    for prefix in missing {
        let uri = match WELL_KNOWN_PREFIXES.iter().find(|(known, _)| *known == prefix.as_str()) {
            Some((_, uri)) => uri.to_string(),
            None => {
                tracing::warn!("Namespace prefix '{}' is used but never declared", prefix);
                format!("urn:syndicate:undeclared:{}", prefix)
            }
        };
        declarations.push_str(&format!(r#" xmlns:{}="{}""#, prefix, uri));
    }

    format!("{}{}{}", &text[..root_end], declarations, &text[root_end..])
}

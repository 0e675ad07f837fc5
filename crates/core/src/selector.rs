use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use sxd_document::dom::Element;
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::coerce::RawValue;
use crate::error::ExtractionError;

/// Namespace bound implicitly in every selector context.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|'[^']*'"#).expect("string literal pattern is valid"));

static PREFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|::|[^\w.:\-])([A-Za-z_][\w.\-]*):[A-Za-z_*]").expect("prefixed name pattern is valid")
});

/// XPath selector evaluator for feed items
pub struct SelectorEvaluator {
    factory: Factory,
}

impl SelectorEvaluator {
    /// Create a new selector evaluator
    pub fn new() -> Self {
        Self { factory: Factory::new() }
    }

    /// Compile a selector expression
    pub fn compile(&self, selector: &str) -> Result<XPath, ExtractionError> {
        self.factory
            .build(selector)
            .map_err(|e| ExtractionError::InvalidSelector { selector: selector.to_string(), reason: e.to_string() })?
            .ok_or_else(|| ExtractionError::InvalidSelector {
                selector: selector.to_string(),
                reason: "empty expression".to_string(),
            })
    }

    /// Evaluate a compiled selector relative to an item node
    ///
    /// Node sets are returned as the string value of each node in document order;
    /// numbers and booleans are rendered as strings.
    pub fn evaluate<'d>(
        &self, xpath: &XPath, selector: &str, context: &Context<'d>, node: Element<'d>,
    ) -> Result<RawValue, ExtractionError> {
        let value = xpath
            .evaluate(context, node)
            .map_err(|e| ExtractionError::Evaluation { selector: selector.to_string(), reason: e.to_string() })?;

        Ok(match value {
            Value::String(s) => RawValue::Scalar(s),
            Value::Nodeset(nodeset) => {
                RawValue::Nodes(nodeset.document_order().iter().map(|node| node.string_value()).collect())
            }
            Value::Number(n) => RawValue::Scalar(n.to_string()),
            Value::Boolean(b) => RawValue::Scalar(b.to_string()),
        })
    }

    /// Compile and evaluate a selector in one step
    pub fn evaluate_str<'d>(
        &self, selector: &str, context: &Context<'d>, node: Element<'d>,
    ) -> Result<RawValue, ExtractionError> {
        let xpath = self.compile(selector)?;
        self.evaluate(&xpath, selector, context, node)
    }
}

impl Default for SelectorEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an evaluation context with the given prefix bindings
pub fn namespace_context<'d>(namespaces: &IndexMap<String, String>) -> Context<'d> {
    let mut context = Context::new();
    context.set_namespace("xml", XML_NS);
    for (prefix, uri) in namespaces {
        context.set_namespace(prefix, uri);
    }
    context
}

/// Namespace prefixes referenced by a selector, in order of first use
///
/// String literals are ignored, as are axis names (`child::`) and the
/// implicitly bound `xml` prefix.
pub fn referenced_prefixes(selector: &str) -> Vec<String> {
    let stripped = STRING_LITERAL.replace_all(selector, "''");
    let mut prefixes: Vec<String> = Vec::new();

    for captures in PREFIXED_NAME.captures_iter(&stripped) {
        let prefix = &captures[1];
        if prefix != "xml" && !prefixes.iter().any(|p| p == prefix) {
            prefixes.push(prefix.to_string());
        }
    }

    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;
    use sxd_document::dom::ChildOfRoot;
    use sxd_document::parser;

    const ENTRY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/">
        <title>First</title>
        <category term="rust"/>
        <dc:subject>xml</dc:subject>
        <category term="feeds"/>
    </entry>"#;

    fn atom_namespaces() -> IndexMap<String, String> {
        let mut namespaces = IndexMap::new();
        namespaces.insert("a10".to_string(), "http://www.w3.org/2005/Atom".to_string());
        namespaces.insert("dc".to_string(), "http://purl.org/dc/elements/1.1/".to_string());
        namespaces
    }

    fn root_element(package: &sxd_document::Package) -> Element<'_> {
        package
            .as_document()
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_evaluate_string_selector() {
        let package = parser::parse(ENTRY).unwrap();
        let entry = root_element(&package);
        let evaluator = SelectorEvaluator::new();
        let context = namespace_context(&atom_namespaces());

        let result = evaluator.evaluate_str("string(a10:title)", &context, entry).unwrap();
        assert_eq!(result, RawValue::Scalar("First".to_string()));
    }

    #[test]
    fn test_evaluate_nodeset_in_document_order() {
        let package = parser::parse(ENTRY).unwrap();
        let entry = root_element(&package);
        let evaluator = SelectorEvaluator::new();
        let context = namespace_context(&atom_namespaces());

        let result = evaluator
            .evaluate_str("dc:subject|a10:category/@term", &context, entry)
            .unwrap();
        assert_eq!(
            result,
            RawValue::Nodes(vec!["rust".to_string(), "xml".to_string(), "feeds".to_string()])
        );
    }

    #[test]
    fn test_evaluate_missing_is_empty() {
        let package = parser::parse(ENTRY).unwrap();
        let entry = root_element(&package);
        let evaluator = SelectorEvaluator::new();
        let context = namespace_context(&atom_namespaces());

        let result = evaluator.evaluate_str("string(a10:summary)", &context, entry).unwrap();
        assert!(result.is_empty());

        let result = evaluator.evaluate_str("a10:link", &context, entry).unwrap();
        assert_eq!(result, RawValue::Nodes(Vec::new()));
    }

    #[test]
    fn test_evaluate_number() {
        let package = parser::parse(ENTRY).unwrap();
        let entry = root_element(&package);
        let evaluator = SelectorEvaluator::new();
        let context = namespace_context(&atom_namespaces());

        let result = evaluator.evaluate_str("count(a10:category)", &context, entry).unwrap();
        assert_eq!(result, RawValue::Scalar("2".to_string()));
    }

    #[test]
    fn test_invalid_selector() {
        let evaluator = SelectorEvaluator::new();
        let result = evaluator.compile("string(a10:title");
        assert!(matches!(result, Err(ExtractionError::InvalidSelector { .. })));
    }

    #[test]
    fn test_referenced_prefixes() {
        assert_eq!(referenced_prefixes("string(a03:id|a10:id)"), vec!["a03", "a10"]);
        assert_eq!(
            referenced_prefixes("string(a03:author/a03:name|a10:author/a10:name)"),
            vec!["a03", "a10"]
        );
        assert_eq!(referenced_prefixes("string(@rdf:about|r090:link)"), vec!["rdf", "r090"]);
        assert_eq!(referenced_prefixes("dc:subject|a10:category/@term"), vec!["dc", "a10"]);
        assert!(referenced_prefixes("string(guid)").is_empty());
    }

    #[test]
    fn test_referenced_prefixes_ignores_literals_and_axes() {
        assert!(referenced_prefixes(r#"string(link[@rel="x:y"]/@href)"#).is_empty());
        assert_eq!(referenced_prefixes("child::x:item/@xml:lang"), vec!["x"]);
        assert_eq!(referenced_prefixes("x:*"), vec!["x"]);
    }
}

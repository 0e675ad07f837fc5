use sxd_document::dom::{ChildOfElement, Element};
use sxd_xpath::{Context, XPath};

use crate::dialect::{Dialect, PathStep};
use crate::document::FeedDocument;
use crate::error::ExtractionError;
use crate::registry::Registry;
use crate::selector::{SelectorEvaluator, namespace_context};
use crate::story::Story;

/// Configuration for story extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Turn `extra` values that look like dates into dates
    pub extra_dates: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { extra_dates: true }
    }
}

/// A dialect with its item root parsed and selectors compiled
struct CompiledDialect<'r> {
    dialect: &'r Dialect,
    steps: Vec<PathStep>,
    selectors: Vec<(&'r str, &'r str, XPath)>,
}

impl<'r> CompiledDialect<'r> {
    fn compile(dialect: &'r Dialect, evaluator: &SelectorEvaluator) -> Result<Self, ExtractionError> {
        let steps = dialect
            .steps()
            .map_err(|e| ExtractionError::InvalidSelector { selector: dialect.item_root.clone(), reason: e.to_string() })?;

        let selectors = dialect
            .fields
            .iter()
            .map(|(field, selector)| Ok((field.as_str(), selector.as_str(), evaluator.compile(selector)?)))
            .collect::<Result<Vec<_>, ExtractionError>>()?;

        Ok(Self { dialect, steps, selectors })
    }
}

/// Extract stories from a document with the default configuration
pub fn extract(document: &FeedDocument, registry: &Registry) -> Result<Vec<Story>, ExtractionError> {
    extract_with_config(document, registry, &ExtractConfig::default())
}

/// Extract stories from a document
///
/// Every dialect of the registry is matched against the document in registry
/// order. Stories are returned grouped by dialect, and in document order within
/// a dialect. A dialect without matches contributes nothing.
///
/// # Errors
///
/// Fails on the first malformed selector (checked for every dialect before any
/// matching) and on the first fixed date field that is not a date. No partial
/// result is returned.
pub fn extract_with_config(
    document: &FeedDocument, registry: &Registry, config: &ExtractConfig,
) -> Result<Vec<Story>, ExtractionError> {
    let evaluator = SelectorEvaluator::new();
    let compiled = registry
        .iter()
        .map(|dialect| CompiledDialect::compile(dialect, &evaluator))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(root) = document.root_element() else {
        return Ok(Vec::new());
    };

    let mut stories = Vec::new();

    for dialect in &compiled {
        let items = match_item_root(root, &dialect.steps, dialect.dialect)?;
        tracing::debug!("Dialect {} matched {} item(s)", dialect.dialect.name, items.len());

        if items.is_empty() {
            continue;
        }

        let context = namespace_context(&dialect.dialect.namespaces);
        for item in items {
            let story = extract_story(&evaluator, item, dialect, &context, config)?;
            tracing::trace!("Extracted {} story '{}'", story.spec, story.title);
            stories.push(story);
        }
    }

    Ok(stories)
}

/// Extract one story from an item node using a dialect's field map
///
/// ```rust
/// use syndicate_core::{Dialect, ExtractConfig, FeedDocument, extract_item};
///
/// let doc = FeedDocument::parse(b"<item><title>Hello</title><category>a</category></item>").unwrap();
/// let story = extract_item(doc.root_element().unwrap(), &Dialect::rss(), &ExtractConfig::default()).unwrap();
///
/// assert_eq!(story.title, "Hello");
/// assert_eq!(story.tags, vec!["a"]);
/// ```
pub fn extract_item(node: Element<'_>, dialect: &Dialect, config: &ExtractConfig) -> Result<Story, ExtractionError> {
    let evaluator = SelectorEvaluator::new();
    let compiled = CompiledDialect::compile(dialect, &evaluator)?;
    let context = namespace_context(&dialect.namespaces);
    extract_story(&evaluator, node, &compiled, &context, config)
}

fn extract_story<'d>(
    evaluator: &SelectorEvaluator, node: Element<'d>, dialect: &CompiledDialect<'_>, context: &Context<'d>,
    config: &ExtractConfig,
) -> Result<Story, ExtractionError> {
    let mut story = Story::new(dialect.dialect.name.as_str());

    for (field, selector, xpath) in &dialect.selectors {
        let raw = evaluator.evaluate(xpath, selector, context, node)?;
        story.assign(field, raw, config.extra_dates)?;
    }

    Ok(story)
}

/// Locate item nodes for an item root, in document order
fn match_item_root<'d>(
    root: Element<'d>, steps: &[PathStep], dialect: &Dialect,
) -> Result<Vec<Element<'d>>, ExtractionError> {
    let Some((first, rest)) = steps.split_first() else {
        return Ok(Vec::new());
    };

    if !step_matches(root, first, dialect)? {
        return Ok(Vec::new());
    }

    let mut current = vec![root];
    for step in rest {
        let mut next = Vec::new();
        for element in &current {
            for child in element.children() {
                if let ChildOfElement::Element(child) = child
                    && step_matches(child, step, dialect)?
                {
                    next.push(child);
                }
            }
        }
        if next.is_empty() {
            return Ok(next);
        }
        current = next;
    }

    Ok(current)
}

fn step_matches(element: Element<'_>, step: &PathStep, dialect: &Dialect) -> Result<bool, ExtractionError> {
    let name = element.name();
    if name.local_part() != step.local {
        return Ok(false);
    }

    match &step.prefix {
        None => Ok(true),
        Some(prefix) => {
            let uri = dialect.namespaces.get(prefix).ok_or_else(|| ExtractionError::InvalidSelector {
                selector: dialect.item_root.clone(),
                reason: format!("unbound namespace prefix '{}'", prefix),
            })?;
            Ok(name.namespace_uri() == Some(uri.as_str()))
        }
    }
}

pub mod coerce;
pub mod dialect;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod loader;
pub mod reader;
pub mod registry;
pub mod selector;
pub mod story;

#[doc(hidden)]
pub use coerce::{RawValue, coerce_date, coerce_extra, coerce_list, coerce_text, looks_like_date, parse_date};
pub use coerce::FieldValue;
pub use dialect::{ATOM_03_NS, ATOM_10_NS, DC_NS, Dialect, PathStep, RDF_NS, RSS_10_NS, RSS_090_NS};
pub use document::{FeedDocument, ParseOptions};
pub use error::{CoercionError, ConfigError, ExtractionError, ReadError, Result};
pub use extract::{ExtractConfig, extract, extract_item, extract_with_config};
#[cfg(feature = "fetch")]
pub use fetch::ReqwestClient;
pub use fetch::{FetchConfig, HttpClient, fetch_file, fetch_reader, fetch_stdin, parse_url};
pub use formatters::{JsonConfig, JsonFormatter, MarkdownConfig, MarkdownFormatter, TextConfig, TextFormatter};
pub use formatters::{convert_to_json, convert_to_markdown, convert_to_text, story_record};
pub use loader::{DialectLoader, DialectLoaderBuilder};
#[cfg(feature = "fetch")]
pub use reader::read;
pub use reader::{FeedReader, Input, ReaderConfig, ReaderConfigBuilder, read_str};
pub use registry::{Registry, build_registry};
#[doc(hidden)]
pub use selector::{SelectorEvaluator, namespace_context, referenced_prefixes};
pub use story::{Field, Story};

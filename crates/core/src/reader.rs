//! Main feed reading API.
//!
//! [`FeedReader`] takes any [`Input`] (a URL, a file path, raw content or a
//! reader), fetches it when needed, parses it and runs extraction against its
//! registry. The convenience functions [`read`] and [`read_str`] use the
//! built-in dialects.
//!
//! # Example
//!
//! ```rust
//! use syndicate_core::read_str;
//!
//! let xml = r#"<rss version="2.0"><channel>
//!     <item><title>One</title><pubDate>Tue, 10 Jun 2003 04:00:00 GMT</pubDate></item>
//!     <item><title>Two</title></item>
//! </channel></rss>"#;
//!
//! let stories = read_str(xml).unwrap();
//! assert_eq!(stories.len(), 2);
//! assert_eq!(stories[0].spec, "RSS");
//! assert_eq!(stories[0].published, stories[0].updated);
//! ```

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::document::{FeedDocument, ParseOptions};
use crate::error::Result;
use crate::extract::{ExtractConfig, extract_with_config};
use crate::fetch::{FetchConfig, HttpClient, fetch_file, fetch_reader};
use crate::registry::Registry;
use crate::story::Story;

/// Something a feed can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Fetched with the reader's HTTP client.
    Url(Url),
    /// Read from the filesystem.
    Path(PathBuf),
    /// Already-available feed content.
    Content(Vec<u8>),
}

impl Input {
    /// Classify a string: absolute http(s) URLs are URLs, anything else is content.
    ///
    /// ```rust
    /// use syndicate_core::Input;
    ///
    /// assert!(matches!(Input::detect("https://example.com/feed.xml"), Input::Url(_)));
    /// assert!(matches!(Input::detect("<rss/>"), Input::Content(_)));
    /// ```
    pub fn detect(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(url) = Url::parse(trimmed)
            && matches!(url.scheme(), "http" | "https")
        {
            return Input::Url(url);
        }
        Input::Content(input.as_bytes().to_vec())
    }

    /// Read an open handle (file, stdin, socket) to the end
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Input::Content(fetch_reader(reader)?))
    }
}

impl From<&str> for Input {
    fn from(input: &str) -> Self {
        Input::detect(input)
    }
}

impl From<String> for Input {
    fn from(input: String) -> Self {
        Input::detect(&input)
    }
}

impl From<&String> for Input {
    fn from(input: &String) -> Self {
        Input::detect(input)
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Content(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Content(bytes.to_vec())
    }
}

impl From<Url> for Input {
    fn from(url: Url) -> Self {
        Input::Url(url)
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

/// Configuration for [`FeedReader`].
///
/// # Example
///
/// ```rust
/// use syndicate_core::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .timeout(10)
///     .max_bytes(Some(5 * 1024 * 1024))
///     .extra_dates(false)
///     .build();
///
/// assert_eq!(config.fetch.timeout, 10);
/// assert!(!config.extract.extra_dates);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Document parsing options.
    pub parse: ParseOptions,

    /// Extraction options.
    pub extract: ExtractConfig,

    /// HTTP options, used by the default client.
    pub fetch: FetchConfig,
}

impl ReaderConfig {
    /// Creates a new builder for ReaderConfig.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::new()
    }
}

/// Builder for ReaderConfig.
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ReaderConfig::default() }
    }

    /// Sets the document size limit.
    pub fn max_bytes(mut self, value: Option<usize>) -> Self {
        self.config.parse.max_bytes = value;
        self
    }

    /// Sets whether named entities are substituted.
    pub fn resolve_entities(mut self, value: bool) -> Self {
        self.config.parse.resolve_entities = value;
        self
    }

    /// Sets whether the DOCTYPE is removed.
    pub fn strip_doctype(mut self, value: bool) -> Self {
        self.config.parse.strip_doctype = value;
        self
    }

    /// Sets whether namespace declarations are repaired.
    pub fn clean_namespaces(mut self, value: bool) -> Self {
        self.config.parse.clean_namespaces = value;
        self
    }

    /// Sets whether date-like extra values become dates.
    pub fn extra_dates(mut self, value: bool) -> Self {
        self.config.extract.extra_dates = value;
        self
    }

    /// Sets the HTTP timeout in seconds.
    pub fn timeout(mut self, value: u64) -> Self {
        self.config.fetch.timeout = value;
        self
    }

    /// Sets the HTTP User-Agent.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> ReaderConfig {
        self.config
    }
}

impl Default for ReaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads feeds into stories.
///
/// Cloning is cheap: the registry and HTTP client are shared, so clones can
/// read different feeds concurrently on separate tasks or threads.
#[derive(Clone)]
pub struct FeedReader {
    registry: Arc<Registry>,
    client: Arc<dyn HttpClient>,
    config: ReaderConfig,
}

impl FeedReader {
    /// Reader with the built-in dialects and the default HTTP client.
    #[cfg(feature = "fetch")]
    pub fn new() -> Self {
        Self::with_config(Registry::builtin(), ReaderConfig::default())
    }

    /// Reader with a custom registry and configuration, using the default HTTP client.
    #[cfg(feature = "fetch")]
    pub fn with_config(registry: Registry, config: ReaderConfig) -> Self {
        let client = crate::fetch::ReqwestClient::new(config.fetch.clone());
        Self::with_client(registry, config, client)
    }

    /// Reader with a caller-supplied HTTP client.
    pub fn with_client(registry: Registry, config: ReaderConfig, client: impl HttpClient + 'static) -> Self {
        Self { registry: Arc::new(registry), client: Arc::new(client), config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read stories from any input.
    ///
    /// URLs are fetched first; a transport failure or non-2xx response fails
    /// the read before any extraction happens.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use syndicate_core::FeedReader;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let reader = FeedReader::new();
    /// let stories = reader.read("https://example.com/feed.xml").await?;
    /// for story in stories {
    ///     println!("{}: {}", story.spec, story.title);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read(&self, input: impl Into<Input>) -> Result<Vec<Story>> {
        let bytes = match input.into() {
            Input::Url(url) => {
                tracing::info!("Fetching {} with {} client", url, self.client.name());
                let body = self.client.get(&url).await?;
                tracing::info!("Fetched {} bytes from {}", body.len(), url);
                body
            }
            Input::Path(path) => fetch_file(&path)?,
            Input::Content(bytes) => bytes,
        };

        self.read_bytes(&bytes)
    }

    /// Read stories from a file.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Vec<Story>> {
        let bytes = fetch_file(path.as_ref())?;
        self.read_bytes(&bytes)
    }

    /// Read stories from feed content that is already in memory.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Vec<Story>> {
        let document = FeedDocument::parse_with_options(bytes, &self.config.parse)?;
        let stories = extract_with_config(&document, &self.registry, &self.config.extract)?;
        tracing::debug!("Extracted {} stories", stories.len());
        Ok(stories)
    }
}

#[cfg(feature = "fetch")]
impl Default for FeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FeedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedReader")
            .field("registry", &self.registry)
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Read stories from any input with the built-in dialects.
#[cfg(feature = "fetch")]
pub async fn read(input: impl Into<Input>) -> Result<Vec<Story>> {
    FeedReader::new().read(input).await
}

/// Read stories from feed text with the built-in dialects.
pub fn read_str(xml: &str) -> Result<Vec<Story>> {
    let document = FeedDocument::parse(xml.as_bytes())?;
    Ok(extract_with_config(&document, &Registry::builtin(), &ExtractConfig::default())?)
}

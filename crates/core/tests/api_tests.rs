//! Library API integration tests
use async_trait::async_trait;
use rstest::rstest;
use syndicate_core::*;
use tempfile::TempDir;
use url::Url;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> Vec<Story> {
    let bytes = std::fs::read(get_fixture_path(name)).unwrap();
    FeedReader::with_client(Registry::builtin(), ReaderConfig::default(), FixtureClient).read_bytes(&bytes).unwrap()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
}

/// Serves fixture files by the last path segment of the requested URL
struct FixtureClient;

#[async_trait]
impl HttpClient for FixtureClient {
    async fn get(&self, url: &Url) -> syndicate_core::Result<Vec<u8>> {
        let name = url.path_segments().and_then(|mut segments| segments.next_back()).unwrap_or_default();
        match std::fs::read(get_fixture_path(name)) {
            Ok(bytes) => Ok(bytes),
            Err(_) => Err(ReadError::Status { url: url.to_string(), status: 404 }),
        }
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

#[rstest]
#[case("atom10.xml", 15, "Atom")]
#[case("atom03.xml", 3, "Atom")]
#[case("rss090.xml", 15, "RDF")]
#[case("rss10.xml", 15, "RDF")]
#[case("rss20.xml", 5, "RSS")]
#[case("podcast.xml", 3, "RSS")]
fn test_fixture_story_counts(#[case] fixture: &str, #[case] count: usize, #[case] spec: &str) {
    let stories = read_fixture(fixture);
    assert_eq!(stories.len(), count);
    assert!(stories.iter().all(|story| story.spec == spec));
    assert!(stories.iter().all(|story| !story.title.is_empty()));
}

#[test]
fn test_atom10_entry() {
    let stories = read_fixture("atom10.xml");
    let first = &stories[0];

    assert_eq!(first.id, "tag:example.org,2005:post-1");
    assert_eq!(first.title, "Parsing XML without tears");
    assert_eq!(first.url, "http://example.org/2005/07/02/post-1");
    assert_eq!(first.author, "Author 1");
    assert_eq!(first.tags, vec!["xml", "feeds"]);
    assert_eq!(first.content, "<p>Entry 1 is about parsing xml without tears.</p>");

    let published = first.published.unwrap();
    assert_eq!(published.to_rfc3339(), "2005-07-02T09:30:00-04:00");
    let updated = first.updated.unwrap();
    assert_eq!(updated.to_rfc3339(), "2005-07-02T14:30:00+00:00");

    assert!(first.extra.is_empty());
}

#[test]
fn test_atom10_dublin_core_subjects_are_tags() {
    let stories = read_fixture("atom10.xml");
    assert_eq!(stories[2].tags, vec!["xml", "feeds", "syndication"]);
    assert_eq!(stories[1].tags, vec!["rust"]);
}

#[test]
fn test_atom03_entry() {
    let stories = read_fixture("atom03.xml");
    let first = &stories[0];

    assert_eq!(first.id, "tag:example.org,2003:3.2801");
    assert_eq!(first.url, "http://example.org/2003/12/11/entry");
    assert_eq!(first.author, "Mark");
    assert_eq!(first.tags, vec!["history"]);
    assert_eq!(first.published.unwrap().to_rfc3339(), "2003-12-11T08:29:29-04:00");
    assert_eq!(first.updated.unwrap().to_rfc3339(), "2003-12-11T18:30:02+00:00");
}

#[test]
fn test_rss090_id_falls_back_to_link() {
    let stories = read_fixture("rss090.xml");
    for story in &stories {
        assert!(!story.id.is_empty());
        assert_eq!(story.id, story.url);
        assert!(story.published.is_none());
    }
    assert_eq!(stories[0].url, "http://example.net/stories/1.html");
}

#[test]
fn test_rss10_item() {
    let stories = read_fixture("rss10.xml");
    let first = &stories[0];

    assert_eq!(first.id, "http://example.com/articles/1");
    assert_eq!(first.url, "http://example.com/articles/1.html");
    assert_eq!(first.author, "Writer 1");
    assert_eq!(first.tags, vec!["feeds"]);
    assert_eq!(first.content, "Article 1: parsing xml without tears & more.");
    assert_eq!(first.published, first.updated);
    assert_eq!(first.published.unwrap().to_rfc3339(), "2005-07-02T09:30:00+01:00");
}

#[test]
fn test_rss20_items() {
    let stories = read_fixture("rss20.xml");

    for story in &stories {
        assert!(story.published.is_some());
        assert_eq!(story.published, story.updated);
    }

    let first = &stories[0];
    assert_eq!(first.title, "Star City");
    assert_eq!(first.url, "http://liftoff.msfc.nasa.gov/news/2003/news-starcity.asp");
    assert_eq!(first.id, "http://liftoff.msfc.nasa.gov/2003/06/03.html#item571");
    assert_eq!(first.tags, vec!["space", "training"]);
    assert!(first.content.contains(r#"<a href="http://howe.iki.rssi.ru/GCTC/gctc_e.htm">Star City</a>"#));

    assert!(stories[2].tags.is_empty());
    assert_eq!(stories[3].published.unwrap().offset().local_minus_utc(), -4 * 3600);
    assert_eq!(stories[4].published.unwrap().offset().local_minus_utc(), -5 * 3600);
}

#[test]
fn test_undeclared_prefix_is_tolerated() {
    let stories = read_fixture("podcast.xml");
    assert_eq!(stories[0].title, "Episode 1");
    assert_eq!(stories[0].url, "http://example.com/podcast/1");
}

#[test]
fn test_fetch_matches_file_read() {
    let reader = FeedReader::with_client(Registry::builtin(), ReaderConfig::default(), FixtureClient);

    let fetched = block_on(reader.read("http://feeds.example.test/atom10.xml")).unwrap();
    let from_file = reader.read_file(get_fixture_path("atom10.xml")).unwrap();

    assert_eq!(fetched.len(), 15);
    assert_eq!(fetched, from_file);
}

#[test]
fn test_fetch_failure_is_surfaced() {
    let reader = FeedReader::with_client(Registry::builtin(), ReaderConfig::default(), FixtureClient);
    let result = block_on(reader.read("http://feeds.example.test/missing.xml"));
    assert!(matches!(result, Err(ReadError::Status { status: 404, .. })));
}

#[test]
fn test_read_path_input() {
    let reader = FeedReader::with_client(Registry::builtin(), ReaderConfig::default(), FixtureClient);
    let path = std::path::PathBuf::from(get_fixture_path("rss20.xml"));
    let stories = block_on(reader.read(path)).unwrap();
    assert_eq!(stories.len(), 5);
}

#[test]
fn test_missing_file() {
    let reader = FeedReader::with_client(Registry::builtin(), ReaderConfig::default(), FixtureClient);
    assert!(matches!(
        reader.read_file(get_fixture_path("nonexistent.xml")),
        Err(ReadError::FileNotFound(_))
    ));
}

#[test]
fn test_unbound_prefix_in_custom_dialect() {
    let custom = Dialect::new("Custom", "custom/item")
        .field("title", "string(title)")
        .field("summary", "string(x:summary)");

    match Registry::build([custom]) {
        Err(ConfigError::UnboundPrefix { dialect, location, prefix }) => {
            assert_eq!(dialect, "Custom");
            assert_eq!(location, "summary");
            assert_eq!(prefix, "x");
        }
        other => panic!("expected unbound prefix error, got {:?}", other),
    }
}

#[test]
fn test_custom_dialect_from_directory() {
    let loader = DialectLoader::builder()
        .custom_dir(get_fixture_path("dialects"))
        .standard_dir(TempDir::new().unwrap().path().join("absent"))
        .build();
    let registry = loader.build_registry().unwrap();

    assert_eq!(registry.len(), 3);
    let rss = registry.get("rss/channel/item").unwrap();
    assert_eq!(rss.name, "RSS");
    assert_eq!(rss.fields["title"], "string(title)");
    assert_eq!(rss.fields["author"], "string(dc:creator)");

    let reader = FeedReader::with_client(registry, ReaderConfig::default(), FixtureClient);
    let stories = reader.read_file(get_fixture_path("podcast.xml")).unwrap();

    assert_eq!(stories[0].author, "Host One");
    assert_eq!(stories[0].extra["duration"], FieldValue::Text("12:30".to_string()));
    assert_eq!(
        stories[0].extra["enclosures"],
        FieldValue::List(vec!["http://example.com/podcast/1.mp3".to_string()])
    );
    assert_eq!(stories[2].author, "");
    assert_eq!(stories[2].extra["enclosures"], FieldValue::List(Vec::new()));

    let record = story_record(&stories[0]);
    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["id", "url", "title", "content", "author", "tags", "published", "updated", "duration", "enclosures", "spec"]
    );
}

#[test]
fn test_dialect_written_at_runtime() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("releases.toml"),
        r#"
[[dialect]]
name = "Releases"
item_root = "releases/release"

[dialect.fields]
id = "string(@version)"
title = "string(name)"
published = "string(date)"
"#,
    )
    .unwrap();

    let loader = DialectLoader::builder().custom_dir(tmp.path()).standard_dir(tmp.path().join("none")).build();
    let registry = loader.build_registry().unwrap();
    assert_eq!(registry.item_roots().last(), Some(&"releases/release"));

    let xml = r#"<releases>
        <release version="1.0"><name>First</name><date>2024-01-02</date></release>
        <release version="1.1"><name>Second</name><date>2024-03-04</date></release>
    </releases>"#;
    let reader = FeedReader::with_client(registry, ReaderConfig::default(), FixtureClient);
    let stories = reader.read_bytes(xml.as_bytes()).unwrap();

    assert_eq!(stories.len(), 2);
    assert_eq!(stories[1].spec, "Releases");
    assert_eq!(stories[1].id, "1.1");
    assert_eq!(stories[1].published.unwrap().to_rfc3339(), "2024-03-04T00:00:00+00:00");
}

#[test]
fn test_read_str() {
    let xml = std::fs::read_to_string(get_fixture_path("rss20.xml")).unwrap();
    let stories = read_str(&xml).unwrap();
    assert_eq!(stories.len(), 5);
    assert_eq!(stories, read_fixture("rss20.xml"));
}

#[test]
fn test_malformed_feed() {
    assert!(matches!(read_str("<rss><channel>"), Err(ReadError::Extraction(ExtractionError::Parse(_)))));
}

#[test]
fn test_unrecognized_root_yields_nothing() {
    assert!(read_str("<html><body><p>Not a feed</p></body></html>").unwrap().is_empty());
}

#[test]
fn test_max_bytes_limit() {
    let config = ReaderConfig::builder().max_bytes(Some(64)).build();
    let reader = FeedReader::with_client(Registry::builtin(), config, FixtureClient);
    assert!(matches!(
        reader.read_file(get_fixture_path("rss20.xml")),
        Err(ReadError::Extraction(ExtractionError::TooLarge { limit: 64, .. }))
    ));
}

#[test]
fn test_output_formats() {
    let stories = read_fixture("rss20.xml");

    let json = convert_to_json(&stories, &JsonConfig::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 5);
    assert_eq!(value[0]["spec"], "RSS");

    let text = convert_to_text(&stories, &TextConfig::default());
    assert!(text.starts_with("Star City\n"));

    let markdown = convert_to_markdown(&stories, &MarkdownConfig::default());
    assert!(markdown.starts_with("## [Star City](http://liftoff.msfc.nasa.gov/news/2003/news-starcity.asp)"));
}

use crate::story::Story;

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Convert each story's content below its heading
    pub include_content: bool,
    /// Emit a TOML frontmatter block per story instead of a metadata line
    pub include_frontmatter: bool,
}

/// Convert stories to a Markdown document, one section per story
pub fn convert_to_markdown(stories: &[Story], config: &MarkdownConfig) -> String {
    stories
        .iter()
        .map(|story| story_to_markdown(story, config))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn story_to_markdown(story: &Story, config: &MarkdownConfig) -> String {
    let mut output = String::new();

    if config.include_frontmatter {
        output.push_str(&generate_frontmatter(story));
        output.push('\n');
    }

    let title = if story.title.trim().is_empty() { "(untitled)" } else { story.title.trim() };
    if story.url.is_empty() {
        output.push_str(&format!("## {}\n", title));
    } else {
        output.push_str(&format!("## [{}]({})\n", escape_brackets(title), story.url));
    }

    if !config.include_frontmatter {
        let mut meta_parts = Vec::new();
        if !story.author.is_empty() {
            meta_parts.push(format!("*{}*", story.author));
        }
        if let Some(published) = &story.published {
            meta_parts.push(published.to_rfc3339());
        }
        if !story.tags.is_empty() {
            meta_parts.push(story.tags.iter().map(|tag| format!("`{}`", tag)).collect::<Vec<_>>().join(" "));
        }
        if !meta_parts.is_empty() {
            output.push('\n');
            output.push_str(&meta_parts.join(" · "));
            output.push('\n');
        }
    }

    if config.include_content && !story.content.trim().is_empty() {
        output.push('\n');
        output.push_str(html_to_markdown(&story.content).trim());
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// Generate TOML frontmatter from a story's fixed fields
fn generate_frontmatter(story: &Story) -> String {
    let mut frontmatter = String::from("+++");

    frontmatter.push_str(&format!("\nspec = {}", toml_escape_string(&story.spec)));

    for (key, value) in [("id", &story.id), ("url", &story.url), ("author", &story.author)] {
        if !value.is_empty() {
            frontmatter.push_str(&format!("\n{} = {}", key, toml_escape_string(value)));
        }
    }

    if let Some(published) = &story.published {
        frontmatter.push_str(&format!("\npublished = {}", published.to_rfc3339()));
    }

    if let Some(updated) = &story.updated {
        frontmatter.push_str(&format!("\nupdated = {}", updated.to_rfc3339()));
    }

    if !story.tags.is_empty() {
        let tags: Vec<String> = story.tags.iter().map(|tag| toml_escape_string(tag)).collect();
        frontmatter.push_str(&format!("\ntags = [{}]", tags.join(", ")));
    }

    frontmatter.push_str("\n+++\n");
    frontmatter
}

/// Escape a string for TOML format
fn toml_escape_string(s: &str) -> String {
    format!(
        "\"{}\"",
        s.replace('\\', "\\\\").replace('\"', "\\\"").replace('\n', "\\n")
    )
}

fn escape_brackets(s: &str) -> String {
    s.replace('[', "\\[").replace(']', "\\]")
}

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_default()
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}

/// Markdown formatter with configurable options
pub struct MarkdownFormatter {
    config: MarkdownConfig,
}

impl MarkdownFormatter {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, stories: &[Story]) -> String {
        convert_to_markdown(stories, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawValue;

    fn story() -> Story {
        let mut story = Story::new("RSS");
        story.title = "Release [1.0]".to_string();
        story.url = "http://example.org/1".to_string();
        story.author = "Ann".to_string();
        story.tags = vec!["rust".to_string()];
        story.content = "<p>Hello <strong>world</strong></p>".to_string();
        story
            .assign("published", RawValue::Scalar("Tue, 10 Jun 2003 04:00:00 GMT".to_string()), true)
            .unwrap();
        story
    }

    #[test]
    fn test_heading_links_to_story() {
        let markdown = convert_to_markdown(&[story()], &MarkdownConfig::default());
        assert!(markdown.starts_with(r"## [Release \[1.0\]](http://example.org/1)"));
        assert!(markdown.contains("*Ann*"));
        assert!(markdown.contains("`rust`"));
        assert!(!markdown.contains("Hello"));
    }

    #[test]
    fn test_heading_without_url() {
        let mut story = Story::new("RSS");
        story.title = "Plain".to_string();
        assert_eq!(convert_to_markdown(&[story], &MarkdownConfig::default()), "## Plain");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_include_content() {
        let config = MarkdownConfig { include_content: true, ..Default::default() };
        let markdown = convert_to_markdown(&[story()], &config);
        assert!(markdown.contains("Hello **world**"));
    }

    #[test]
    fn test_frontmatter() {
        let config = MarkdownConfig { include_frontmatter: true, ..Default::default() };
        let markdown = convert_to_markdown(&[story()], &config);

        assert!(markdown.starts_with("+++\nspec = \"RSS\""));
        assert!(markdown.contains("url = \"http://example.org/1\""));
        assert!(markdown.contains("published = 2003-06-10T04:00:00+00:00"));
        assert!(markdown.contains("tags = [\"rust\"]"));
        assert!(!markdown.contains("id = "));
        assert!(!markdown.contains("*Ann*"));
    }

    #[test]
    fn test_frontmatter_is_valid_toml() {
        let config = MarkdownConfig { include_frontmatter: true, ..Default::default() };
        let markdown = convert_to_markdown(&[story()], &config);
        let body = markdown.trim_start_matches("+++\n");
        let frontmatter = &body[..body.find("+++").unwrap()];

        let value: toml::Table = toml::from_str(frontmatter).unwrap();
        assert_eq!(value["author"].as_str(), Some("Ann"));
        assert!(value["published"].as_datetime().is_some());
    }

    #[test]
    fn test_toml_escape() {
        assert_eq!(toml_escape_string(r#"Say "hi""#), r#""Say \"hi\"""#);
        assert_eq!(toml_escape_string("a\nb"), r#""a\nb""#);
    }
}

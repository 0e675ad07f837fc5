use crate::story::Story;
use scraper::Html;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M %:z";

/// Configuration for plain text output
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Include story content below the header
    pub include_content: bool,

    /// Wrap content lines at specified width (0 = no wrapping)
    pub line_width: usize,
}

/// Plain text formatter for story listings
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, stories: &[Story]) -> String {
        convert_to_text(stories, &self.config)
    }
}

/// Render stories as a human-readable listing
pub fn convert_to_text(stories: &[Story], config: &TextConfig) -> String {
    stories
        .iter()
        .map(|story| story_to_text(story, config))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn story_to_text(story: &Story, config: &TextConfig) -> String {
    let mut output = generate_header(story);

    if config.include_content && !story.content.trim().is_empty() {
        let text = html_to_text(&story.content);
        let text = if config.line_width > 0 { wrap_text(&text, config.line_width) } else { text };
        output.push('\n');
        output.push_str(&text);
    }

    output.trim_end().to_string()
}

/// Title underline plus one line per populated field
fn generate_header(story: &Story) -> String {
    let mut header = String::new();

    let title = if story.title.trim().is_empty() { "(untitled)" } else { story.title.trim() };
    header.push_str(title);
    header.push('\n');
    header.push_str(&"=".repeat(title.chars().count()));
    header.push('\n');

    let mut meta_parts = vec![format!("Spec: {}", story.spec)];

    if !story.author.is_empty() {
        meta_parts.push(format!("By: {}", story.author));
    }

    if let Some(published) = &story.published {
        meta_parts.push(format!("Published: {}", published.format(DATE_FORMAT)));
    }

    if let Some(updated) = &story.updated
        && story.updated != story.published
    {
        meta_parts.push(format!("Updated: {}", updated.format(DATE_FORMAT)));
    }

    header.push_str(&meta_parts.join(" | "));
    header.push('\n');

    if !story.url.is_empty() {
        header.push_str(&format!("URL: {}\n", story.url));
    }

    if !story.tags.is_empty() {
        header.push_str(&format!("Tags: {}\n", story.tags.join(", ")));
    }

    for (name, value) in &story.extra {
        let rendered = match serde_json::to_value(value) {
            Ok(serde_json::Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(_) => continue,
        };
        header.push_str(&format!("{}: {}\n", name, rendered));
    }

    header
}

/// Feed content is usually escaped HTML; keep only its text
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Wrap text to specified line width
fn wrap_text(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line.push_str(word);
        } else if current_line.chars().count() + 1 + word.chars().count() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join("\n")
}
